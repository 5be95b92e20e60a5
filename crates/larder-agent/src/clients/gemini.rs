//! Google Gemini `generateContent`.

use larder_core::service::{ServiceError, TextGenerator};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Value, json};

use super::{check_status, transport};

const SERVICE: &str = "Gemini";

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";

#[derive(Debug, Deserialize)]
struct GenerateResponse {
  #[serde(default)]
  candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
  content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
  #[serde(default)]
  parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
  text: Option<String>,
}

fn request_body(prompt: &str) -> Value {
  json!({ "contents": [{ "parts": [{ "text": prompt }] }] })
}

/// Concatenated text parts of the first candidate.
fn response_text(resp: GenerateResponse) -> Result<String, ServiceError> {
  let text: String = resp
    .candidates
    .into_iter()
    .next()
    .and_then(|c| c.content)
    .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
    .unwrap_or_default();
  if text.is_empty() {
    return Err(ServiceError::Malformed {
      service: SERVICE,
      message: "response contained no text".into(),
    });
  }
  Ok(text)
}

#[derive(Debug, Clone)]
pub struct GeminiClient {
  http:     Client,
  api_key:  Option<String>,
  model:    String,
  base_url: String,
}

impl GeminiClient {
  pub fn new(http: Client, api_key: Option<String>, model: impl Into<String>) -> Self {
    Self { http, api_key, model: model.into(), base_url: DEFAULT_BASE_URL.to_owned() }
  }

  pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
    self.base_url = base_url.into();
    self
  }

  pub fn is_configured(&self) -> bool { self.api_key.is_some() }

  fn url(&self) -> String {
    format!(
      "{}/v1beta/models/{}:generateContent",
      self.base_url.trim_end_matches('/'),
      self.model
    )
  }
}

impl TextGenerator for GeminiClient {
  async fn generate(&self, prompt: &str) -> Result<String, ServiceError> {
    let key = self.api_key.as_deref().ok_or(ServiceError::MissingCredential(SERVICE))?;

    let resp = self
      .http
      .post(self.url())
      .header("x-goog-api-key", key)
      .json(&request_body(prompt))
      .send()
      .await
      .map_err(transport(SERVICE))?;
    let resp = check_status(SERVICE, resp).await?;

    let parsed: GenerateResponse = resp.json().await.map_err(|e| ServiceError::Malformed {
      service: SERVICE,
      message: e.to_string(),
    })?;
    response_text(parsed)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn body_wraps_prompt() {
    assert_eq!(
      request_body("hi"),
      json!({ "contents": [{ "parts": [{ "text": "hi" }] }] })
    );
  }

  #[test]
  fn joins_parts_of_first_candidate() {
    let resp: GenerateResponse = serde_json::from_value(json!({
      "candidates": [
        { "content": { "parts": [{ "text": "2." }, { "text": "5" }] } },
        { "content": { "parts": [{ "text": "ignored" }] } }
      ]
    }))
    .unwrap();
    assert_eq!(response_text(resp).unwrap(), "2.5");
  }

  #[test]
  fn blocked_response_is_malformed() {
    let resp: GenerateResponse =
      serde_json::from_value(json!({ "promptFeedback": { "blockReason": "SAFETY" } })).unwrap();
    assert!(matches!(response_text(resp), Err(ServiceError::Malformed { .. })));
  }

  #[test]
  fn url_includes_model() {
    let client = GeminiClient::new(Client::new(), None, DEFAULT_MODEL)
      .with_base_url("http://localhost:9000/");
    assert_eq!(
      client.url(),
      "http://localhost:9000/v1beta/models/gemini-1.5-flash:generateContent"
    );
  }

  #[tokio::test]
  async fn missing_key_fails_without_network() {
    let client = GeminiClient::new(Client::new(), None, DEFAULT_MODEL);
    assert_eq!(
      client.generate("hello").await,
      Err(ServiceError::MissingCredential("Gemini"))
    );
  }
}
