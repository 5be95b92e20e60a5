//! Serper Google-search API.

use larder_core::service::{ServiceError, WebSearch};
use reqwest::Client;
use serde_json::json;

use super::{check_status, transport};

const SERVICE: &str = "Serper";

pub const DEFAULT_ENDPOINT: &str = "https://google.serper.dev/search";

/// Returns the raw JSON result text; the model reads it as an observation.
#[derive(Debug, Clone)]
pub struct SerperClient {
  http:     Client,
  api_key:  Option<String>,
  endpoint: String,
}

impl SerperClient {
  pub fn new(http: Client, api_key: Option<String>) -> Self {
    Self { http, api_key, endpoint: DEFAULT_ENDPOINT.to_owned() }
  }

  pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
    self.endpoint = endpoint.into();
    self
  }
}

impl WebSearch for SerperClient {
  async fn search(&self, query: &str) -> Result<String, ServiceError> {
    let key = self.api_key.as_deref().ok_or(ServiceError::MissingCredential(SERVICE))?;

    let resp = self
      .http
      .post(&self.endpoint)
      .header("X-API-KEY", key)
      .json(&json!({ "q": query }))
      .send()
      .await
      .map_err(transport(SERVICE))?;
    let resp = check_status(SERVICE, resp).await?;
    resp.text().await.map_err(transport(SERVICE))
  }
}
