//! SendGrid v3 mail send.

use larder_core::service::{Mailer, OutboundMail, ServiceError};
use reqwest::Client;
use serde::Serialize;

use super::{check_status, transport};

const SERVICE: &str = "SendGrid";

pub const DEFAULT_ENDPOINT: &str = "https://api.sendgrid.com/v3/mail/send";

#[derive(Serialize)]
struct SendGridEmail<'a> {
  personalizations: [Personalization<'a>; 1],
  from:             EmailAddress<'a>,
  subject:          &'a str,
  content:          [Content<'a>; 1],
}

#[derive(Serialize)]
struct Personalization<'a> {
  to: [EmailAddress<'a>; 1],
}

#[derive(Serialize)]
struct EmailAddress<'a> {
  email: &'a str,
}

#[derive(Serialize)]
struct Content<'a> {
  #[serde(rename = "type")]
  content_type: &'static str,
  value:        &'a str,
}

fn request_body(mail: &OutboundMail) -> SendGridEmail<'_> {
  SendGridEmail {
    personalizations: [Personalization { to: [EmailAddress { email: &mail.to }] }],
    from:             EmailAddress { email: &mail.from },
    subject:          &mail.subject,
    content:          [Content { content_type: "text/html", value: &mail.html_body }],
  }
}

#[derive(Debug, Clone)]
pub struct SendGridClient {
  http:     Client,
  api_key:  Option<String>,
  endpoint: String,
}

impl SendGridClient {
  pub fn new(http: Client, api_key: Option<String>) -> Self {
    Self { http, api_key, endpoint: DEFAULT_ENDPOINT.to_owned() }
  }

  pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
    self.endpoint = endpoint.into();
    self
  }
}

impl Mailer for SendGridClient {
  fn is_configured(&self) -> bool { self.api_key.is_some() }

  async fn send(&self, mail: &OutboundMail) -> Result<u16, ServiceError> {
    let key = self.api_key.as_deref().ok_or(ServiceError::MissingCredential(SERVICE))?;

    let resp = self
      .http
      .post(&self.endpoint)
      .bearer_auth(key)
      .json(&request_body(mail))
      .send()
      .await
      .map_err(transport(SERVICE))?;
    let resp = check_status(SERVICE, resp).await?;
    Ok(resp.status().as_u16())
  }
}
