//! The daily expiry alert email.

use std::sync::Arc;

use askama::Template;
use chrono::{Days, NaiveDate};
use larder_core::{
  item::ExpiryWindow,
  service::{Mailer, OutboundMail, TextGenerator},
  store::InventoryStore,
};
use crate::expiry::{ExpiryAggregator, ExpiryGroup, ExpirySummary};

/// Addresses and timing for the alert. Absent addresses disable sending.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlertConfig {
  pub sender:    Option<String>,
  pub recipient: Option<String>,
  /// The alert covers items expiring exactly this many days from today.
  pub lead_days: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
  /// Sender, recipient or mail credential missing.
  NotConfigured,
  /// No unsold items expire on the target day.
  NothingToReport,
}

/// What a single alert run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlertOutcome {
  Sent { status: u16 },
  Skipped(SkipReason),
  Failed(String),
}

// ─── Rendering ───────────────────────────────────────────────────────────────

#[derive(Template)]
#[template(path = "expiry_alert.html")]
struct ExpiryAlertTemplate<'a> {
  groups: &'a [ExpiryGroup],
}

pub fn alert_subject(target: NaiveDate) -> String {
  format!("Urgent: Expiry Alert for {}", target.format("%B %d, %Y"))
}

/// HTML body listing every group, with its carbon impact when known.
/// Product names are escaped.
pub fn alert_body(summary: &ExpirySummary) -> askama::Result<String> {
  ExpiryAlertTemplate { groups: &summary.groups }.render()
}

// ─── Delivery ────────────────────────────────────────────────────────────────

/// Mail `summary` from `sender` to `recipient`.
///
/// Nothing is sent when either address or the mail credential is missing,
/// or when the summary is empty. Failures are logged and returned, never
/// retried.
pub async fn notify<M: Mailer>(
  mailer: &M,
  summary: &ExpirySummary,
  target: NaiveDate,
  sender: Option<&str>,
  recipient: Option<&str>,
) -> AlertOutcome {
  let (Some(from), Some(to)) = (sender, recipient) else {
    tracing::warn!("alert email sender or recipient is not configured; skipping");
    return AlertOutcome::Skipped(SkipReason::NotConfigured);
  };
  if !mailer.is_configured() {
    tracing::warn!("mail service credential is not configured; skipping alert");
    return AlertOutcome::Skipped(SkipReason::NotConfigured);
  }
  if summary.is_empty() {
    tracing::info!(%target, "no expiring items to report");
    return AlertOutcome::Skipped(SkipReason::NothingToReport);
  }

  let html_body = match alert_body(summary) {
    Ok(body) => body,
    Err(e) => {
      tracing::error!("failed to render expiry alert: {e}");
      return AlertOutcome::Failed(e.to_string());
    }
  };
  let mail = OutboundMail {
    from: from.to_owned(),
    to: to.to_owned(),
    subject: alert_subject(target),
    html_body,
  };
  match mailer.send(&mail).await {
    Ok(status) => {
      tracing::info!(status, to, "expiry alert sent");
      AlertOutcome::Sent { status }
    }
    Err(e) => {
      tracing::error!(to, "failed to send expiry alert: {e}");
      AlertOutcome::Failed(e.to_string())
    }
  }
}

/// The scheduled job: aggregate stock expiring `lead_days` from today and
/// mail it.
pub struct DailyAlert<S, G, M> {
  aggregator: ExpiryAggregator<S, G>,
  mailer:     Arc<M>,
  config:     AlertConfig,
}

impl<S, G, M> DailyAlert<S, G, M>
where
  S: InventoryStore,
  G: TextGenerator,
  M: Mailer,
{
  pub fn new(aggregator: ExpiryAggregator<S, G>, mailer: Arc<M>, config: AlertConfig) -> Self {
    Self { aggregator, mailer, config }
  }

  /// Run once against today's local date.
  pub async fn run_daily_alert(&self) -> AlertOutcome {
    self.run(chrono::Local::now().date_naive()).await
  }

  pub async fn run(&self, today: NaiveDate) -> AlertOutcome {
    let configured = self.config.sender.is_some()
      && self.config.recipient.is_some()
      && self.mailer.is_configured();
    if !configured {
      tracing::warn!("email configuration is missing; daily alert skipped");
      return AlertOutcome::Skipped(SkipReason::NotConfigured);
    }

    let Some(target) = today.checked_add_days(Days::new(u64::from(self.config.lead_days)))
    else {
      return AlertOutcome::Failed(format!("alert target date out of range: {today}"));
    };

    tracing::info!(%target, "preparing daily expiry alert");
    let summary = match self.aggregator.aggregate(ExpiryWindow::on(target)).await {
      Ok(s) => s,
      Err(e) => {
        tracing::error!("daily alert could not read inventory: {e}");
        return AlertOutcome::Failed(e.to_string());
      }
    };

    notify(
      self.mailer.as_ref(),
      &summary,
      target,
      self.config.sender.as_deref(),
      self.config.recipient.as_deref(),
    )
    .await
  }
}

#[cfg(test)]
mod tests {
  use larder_core::{item::StockReceipt, product::NewProductType, service::ServiceError};
  use larder_store_sqlite::SqliteStore;

  use super::*;
  use crate::{carbon::CarbonEstimator, fakes::*};

  fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
  }

  fn config() -> AlertConfig {
    AlertConfig {
      sender:    Some("alerts@shop.example".into()),
      recipient: Some("manager@shop.example".into()),
      lead_days: 2,
    }
  }

  fn group(name: &str, count: u64, carbon_per_unit: Option<f64>) -> ExpiryGroup {
    ExpiryGroup {
      product_name: name.into(),
      count,
      location: "Fridge".into(),
      expiry_date: date(2026, 10, 21),
      carbon_per_unit,
      carbon_total: carbon_per_unit.map_or(0.0, |c| c * count as f64),
    }
  }

  async fn store_with(expiring_on: &[(NaiveDate, u32)]) -> Arc<SqliteStore> {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let milk = store
      .create_product_type(NewProductType::new("Milk", 1.0).unwrap())
      .await
      .unwrap()
      .id;
    for (expiry, qty) in expiring_on {
      store
        .receive_stock(StockReceipt::new(milk, *qty, date(2026, 10, 1), *expiry, "Fridge").unwrap())
        .await
        .unwrap();
    }
    Arc::new(store)
  }

  fn job(
    store: Arc<SqliteStore>,
    generator: Arc<FakeGenerator>,
    mailer: Arc<FakeMailer>,
    config: AlertConfig,
  ) -> DailyAlert<SqliteStore, FakeGenerator, FakeMailer> {
    DailyAlert::new(ExpiryAggregator::new(store, CarbonEstimator::new(generator)), mailer, config)
  }

  #[test]
  fn body_uses_carbon_sentence_only_with_estimate() {
    let summary = ExpirySummary {
      window: None,
      groups: vec![group("Milk", 3, Some(1.234)), group("Bread & Butter", 2, None)],
    };
    let body = alert_body(&summary).unwrap();
    assert!(body.contains("<h3>3x Milk</h3>"), "{body}");
    assert!(body.contains("<b>3.70 kg of CO2e</b>"), "{body}");
    assert!(body.contains("<h3>2x Bread &amp; Butter</h3>"), "{body}");
    assert!(body.contains("to prevent product waste."), "{body}");
  }

  #[test]
  fn body_escapes_markup_in_product_names() {
    let summary = ExpirySummary {
      window: None,
      groups: vec![group("<script>alert('x')</script>", 1, None)],
    };
    let body = alert_body(&summary).unwrap();
    assert!(!body.contains("<script>"), "{body}");
    assert!(body.contains("<h3>1x &lt;script&gt;"), "{body}");
    assert!(body.trim_end().ends_with("inventory system.</p>"), "{body}");
  }

  #[test]
  fn subject_names_the_target_date() {
    assert_eq!(
      alert_subject(date(2026, 10, 21)),
      "Urgent: Expiry Alert for October 21, 2026"
    );
  }

  #[tokio::test]
  async fn no_expiring_items_sends_nothing() {
    let today = date(2026, 10, 19);
    let store = store_with(&[(date(2026, 10, 30), 4)]).await;
    let mailer = Arc::new(FakeMailer::accepting(202));
    let alert = job(store, Arc::new(FakeGenerator::replying(["1.0"])), mailer.clone(), config());

    let outcome = alert.run(today).await;
    assert_eq!(outcome, AlertOutcome::Skipped(SkipReason::NothingToReport));
    assert!(mailer.sent().is_empty());
  }

  #[tokio::test]
  async fn sends_items_expiring_on_target_day() {
    let today = date(2026, 10, 19);
    let store = store_with(&[(date(2026, 10, 21), 3), (date(2026, 10, 20), 5)]).await;
    let mailer = Arc::new(FakeMailer::accepting(202));
    let alert = job(store, Arc::new(FakeGenerator::replying(["2"])), mailer.clone(), config());

    let outcome = alert.run(today).await;
    assert_eq!(outcome, AlertOutcome::Sent { status: 202 });

    let sent = mailer.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].from, "alerts@shop.example");
    assert_eq!(sent[0].to, "manager@shop.example");
    assert_eq!(sent[0].subject, "Urgent: Expiry Alert for October 21, 2026");
    assert!(sent[0].html_body.contains("<h3>3x Milk</h3>"));
    assert!(sent[0].html_body.contains("6.00 kg of CO2e"));
  }

  #[tokio::test]
  async fn missing_configuration_skips_before_any_work() {
    let today = date(2026, 10, 19);
    let store = store_with(&[(date(2026, 10, 21), 3)]).await;
    let generator = Arc::new(FakeGenerator::replying(["1.0"]));

    let mailer = Arc::new(FakeMailer::unconfigured());
    let alert = job(store.clone(), generator.clone(), mailer.clone(), config());
    assert_eq!(alert.run(today).await, AlertOutcome::Skipped(SkipReason::NotConfigured));
    assert!(mailer.sent().is_empty());

    let mailer = Arc::new(FakeMailer::accepting(202));
    let no_recipient = AlertConfig { recipient: None, ..config() };
    let alert = job(store, generator.clone(), mailer.clone(), no_recipient);
    assert_eq!(alert.run(today).await, AlertOutcome::Skipped(SkipReason::NotConfigured));
    assert!(mailer.sent().is_empty());

    assert_eq!(generator.calls(), 0);
  }

  #[tokio::test]
  async fn delivery_failure_is_reported_not_retried() {
    let today = date(2026, 10, 19);
    let store = store_with(&[(date(2026, 10, 21), 1)]).await;
    let mailer = Arc::new(FakeMailer::failing(ServiceError::Status {
      service: "SendGrid",
      status:  401,
      body:    "unauthorized".into(),
    }));
    let alert = job(store, Arc::new(FakeGenerator::replying(["1"])), mailer.clone(), config());

    let outcome = alert.run(today).await;
    assert!(matches!(outcome, AlertOutcome::Failed(ref m) if m.contains("401")));
    assert_eq!(mailer.sent().len(), 1);
  }
}
