//! Error types for `larder-core`.

use thiserror::Error;

/// Domain-level failures shared by every store backend.
#[derive(Debug, Error)]
pub enum Error {
  #[error("product type not found: {0}")]
  ProductTypeNotFound(i64),

  #[error("product type {0:?} already exists")]
  DuplicateProductType(String),

  #[error("product name must not be empty")]
  EmptyName,

  #[error("invalid price: {0}")]
  InvalidPrice(f64),

  #[error("quantity must be at least 1, got {0}")]
  InvalidQuantity(u32),

  #[error("quantity must be at most {max}, got {0}", max = crate::item::MAX_RECEIPT_QUANTITY)]
  QuantityTooLarge(u32),

  #[error("no free tag sequence numbers left under {0:?}")]
  TagSequenceExhausted(String),

  #[error("location must not be empty")]
  EmptyLocation,

  #[error("tag must not be empty")]
  EmptyTag,

  #[error("tag {0:?} not found")]
  TagNotFound(String),

  #[error("item with tag {0:?} was already sold")]
  AlreadySold(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Implemented by backend error types that may carry a domain [`Error`].
///
/// Lets the HTTP layer map "not found" and "conflict" outcomes to proper
/// status codes without knowing the concrete backend.
pub trait DomainError {
  fn domain(&self) -> Option<&Error>;
}

impl DomainError for Error {
  fn domain(&self) -> Option<&Error> { Some(self) }
}
