//! Recording fakes for the service traits.

use std::{
  collections::VecDeque,
  sync::{Mutex, PoisonError},
};

use larder_core::service::{Mailer, OutboundMail, ServiceError, TextGenerator, WebSearch};

type Respond = Box<dyn Fn(&str) -> Result<String, ServiceError> + Send + Sync>;

pub struct FakeGenerator {
  respond: Respond,
  prompts: Mutex<Vec<String>>,
}

impl FakeGenerator {
  pub fn responding(
    f: impl Fn(&str) -> Result<String, ServiceError> + Send + Sync + 'static,
  ) -> Self {
    Self { respond: Box::new(f), prompts: Mutex::new(Vec::new()) }
  }

  /// Replies with each of `replies` in turn.
  pub fn replying<'a>(replies: impl IntoIterator<Item = &'a str>) -> Self {
    let queue: Mutex<VecDeque<String>> =
      Mutex::new(replies.into_iter().map(str::to_owned).collect());
    Self::responding(move |_| {
      queue
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .pop_front()
        .ok_or_else(|| ServiceError::Malformed {
          service: "fake",
          message: "no scripted reply left".into(),
        })
    })
  }

  pub fn failing(error: ServiceError) -> Self {
    Self::responding(move |_| Err(error.clone()))
  }

  pub fn prompts(&self) -> Vec<String> {
    self.prompts.lock().unwrap_or_else(PoisonError::into_inner).clone()
  }

  pub fn calls(&self) -> usize { self.prompts().len() }
}

impl TextGenerator for FakeGenerator {
  async fn generate(&self, prompt: &str) -> Result<String, ServiceError> {
    self
      .prompts
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .push(prompt.to_owned());
    (self.respond)(prompt)
  }
}

pub struct FakeSearch {
  result:  Result<String, ServiceError>,
  queries: Mutex<Vec<String>>,
}

impl FakeSearch {
  pub fn returning(text: &str) -> Self {
    Self { result: Ok(text.to_owned()), queries: Mutex::new(Vec::new()) }
  }

  pub fn failing(error: ServiceError) -> Self {
    Self { result: Err(error), queries: Mutex::new(Vec::new()) }
  }

  pub fn queries(&self) -> Vec<String> {
    self.queries.lock().unwrap_or_else(PoisonError::into_inner).clone()
  }
}

impl WebSearch for FakeSearch {
  async fn search(&self, query: &str) -> Result<String, ServiceError> {
    self
      .queries
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .push(query.to_owned());
    self.result.clone()
  }
}

pub struct FakeMailer {
  configured: bool,
  status:     Result<u16, ServiceError>,
  sent:       Mutex<Vec<OutboundMail>>,
}

impl FakeMailer {
  pub fn accepting(status: u16) -> Self {
    Self { configured: true, status: Ok(status), sent: Mutex::new(Vec::new()) }
  }

  pub fn unconfigured() -> Self {
    Self {
      configured: false,
      status:     Err(ServiceError::MissingCredential("SendGrid")),
      sent:       Mutex::new(Vec::new()),
    }
  }

  pub fn failing(error: ServiceError) -> Self {
    Self { configured: true, status: Err(error), sent: Mutex::new(Vec::new()) }
  }

  pub fn sent(&self) -> Vec<OutboundMail> {
    self.sent.lock().unwrap_or_else(PoisonError::into_inner).clone()
  }
}

impl Mailer for FakeMailer {
  fn is_configured(&self) -> bool { self.configured }

  async fn send(&self, mail: &OutboundMail) -> Result<u16, ServiceError> {
    self
      .sent
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .push(mail.clone());
    self.status.clone()
  }
}
