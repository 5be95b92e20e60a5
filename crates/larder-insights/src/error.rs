//! Error types for `larder-insights`.

use std::path::PathBuf;

use thiserror::Error;

/// Failure to read or write one of the datasets.
#[derive(Debug, Error)]
pub enum Error {
  #[error("failed to read {}: {source}", path.display())]
  Csv {
    path:   PathBuf,
    #[source]
    source: csv::Error,
  },

  #[error("failed to write {}: {source}", path.display())]
  Write {
    path:   PathBuf,
    #[source]
    source: csv::Error,
  },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Returned by a summary when the datasets it needs are not loaded.
///
/// The `Display` text is meant to be shown to end users as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Unavailable {
  #[error("Sales data is not available.")]
  Sales,

  #[error("Customer data is not available.")]
  Customers,
}
