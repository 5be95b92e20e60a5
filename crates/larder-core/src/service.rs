//! Traits for the external services Larder calls out to.
//!
//! Each service may be unconfigured (no credential). That is not a fatal
//! condition: implementations report it as
//! [`ServiceError::MissingCredential`] and callers degrade to a sentinel
//! value or skip the work.

use std::future::Future;

use thiserror::Error;

/// A failed call to an external service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
  #[error("{0} API key is not configured")]
  MissingCredential(&'static str),

  #[error("{service} request failed: {message}")]
  Transport {
    service: &'static str,
    message: String,
  },

  #[error("{service} returned status {status}: {body}")]
  Status {
    service: &'static str,
    status:  u16,
    body:    String,
  },

  #[error("unexpected {service} response: {message}")]
  Malformed {
    service: &'static str,
    message: String,
  },
}

/// A large-language-model text completion endpoint.
pub trait TextGenerator: Send + Sync {
  fn generate<'a>(
    &'a self,
    prompt: &'a str,
  ) -> impl Future<Output = Result<String, ServiceError>> + Send + 'a;
}

/// A web search endpoint. Results are returned as opaque text to be pasted
/// into a prompt.
pub trait WebSearch: Send + Sync {
  fn search<'a>(
    &'a self,
    query: &'a str,
  ) -> impl Future<Output = Result<String, ServiceError>> + Send + 'a;
}

/// An outbound HTML email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMail {
  pub from:      String,
  pub to:        String,
  pub subject:   String,
  pub html_body: String,
}

/// A transactional mail delivery endpoint.
pub trait Mailer: Send + Sync {
  /// Whether a delivery credential is present.
  fn is_configured(&self) -> bool;

  /// Hand `mail` to the provider and return the HTTP status it reported.
  fn send<'a>(
    &'a self,
    mail: &'a OutboundMail,
  ) -> impl Future<Output = Result<u16, ServiceError>> + Send + 'a;
}
