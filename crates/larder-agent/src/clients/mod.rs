//! `reqwest` implementations of the service traits.
//!
//! Every client holds an optional credential. A client without one is still
//! constructed; its calls fail fast with
//! [`ServiceError::MissingCredential`](larder_core::service::ServiceError)
//! without touching the network.

mod gemini;
mod sendgrid;
mod serper;

use std::time::Duration;

use larder_core::service::ServiceError;
use reqwest::{Client, Response};

pub use self::{
  gemini::{DEFAULT_MODEL as DEFAULT_GEMINI_MODEL, GeminiClient},
  sendgrid::SendGridClient,
  serper::SerperClient,
};

/// Shared HTTP client for all outbound calls. Cheap to clone.
pub fn http_client(timeout: Duration) -> reqwest::Result<Client> {
  Client::builder().timeout(timeout).build()
}

fn transport(service: &'static str) -> impl FnOnce(reqwest::Error) -> ServiceError {
  move |e| ServiceError::Transport { service, message: e.to_string() }
}

/// Pass successful responses through; turn anything else into
/// [`ServiceError::Status`] carrying the response body.
async fn check_status(service: &'static str, resp: Response) -> Result<Response, ServiceError> {
  let status = resp.status();
  if status.is_success() {
    return Ok(resp);
  }
  let body = resp.text().await.unwrap_or_default();
  Err(ServiceError::Status { service, status: status.as_u16(), body })
}
