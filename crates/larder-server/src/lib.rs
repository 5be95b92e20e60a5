//! Process wiring for the Larder server: configuration, service
//! construction and the background expiry-alert job.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
  time::Duration,
};

use anyhow::Context as _;
use axum::Router;
use larder_agent::{
  AlertConfig, CarbonEstimator, DailyAlert, ExpiryAggregator, QueryResponder,
  clients::{GeminiClient, SendGridClient, SerperClient, http_client},
};
use larder_api::AppState;
use larder_core::{
  service::{Mailer, TextGenerator},
  store::InventoryStore,
};
use larder_insights::{
  InsightCache, LoadSummary,
  generate::{self, GenerateOptions},
};
use larder_store_sqlite::SqliteStore;
use serde::Deserialize;
use tokio::{sync::Notify, task::JoinHandle};
use tower_http::trace::TraceLayer;

/// Timeout applied to every outbound API call.
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `LARDER_*` environment variables. Missing keys take their defaults.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
  pub host:                  String,
  pub port:                  u16,
  pub store_path:            PathBuf,
  /// Directory holding `products.csv`, `customers.csv` and
  /// `transactions.csv`.
  pub data_dir:              PathBuf,
  pub gemini_api_key:        Option<String>,
  pub gemini_model:          String,
  pub serper_api_key:        Option<String>,
  pub sendgrid_api_key:      Option<String>,
  pub sender_email:          Option<String>,
  pub store_manager_email:   Option<String>,
  pub alert_interval_hours:  u64,
  pub alert_lead_days:       u32,
  pub dashboard_window_days: u32,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:                  "127.0.0.1".to_string(),
      port:                  5000,
      store_path:            PathBuf::from("larder.db"),
      data_dir:              PathBuf::from("."),
      gemini_api_key:        None,
      gemini_model:          larder_agent::clients::DEFAULT_GEMINI_MODEL.to_string(),
      serper_api_key:        None,
      sendgrid_api_key:      None,
      sender_email:          None,
      store_manager_email:   None,
      alert_interval_hours:  24,
      alert_lead_days:       2,
      dashboard_window_days: 2,
    }
  }
}

impl ServerConfig {
  /// Layer the optional TOML file at `path` under `LARDER_*` environment
  /// variables.
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    let settings = config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(config::Environment::with_prefix("LARDER"))
      .build()
      .context("failed to read config file")?;

    settings
      .try_deserialize()
      .context("failed to deserialise ServerConfig")
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }

  pub fn alert_period(&self) -> Duration {
    Duration::from_secs(self.alert_interval_hours.max(1) * 60 * 60)
  }

  pub fn alert_config(&self) -> AlertConfig {
    AlertConfig {
      sender:    self.sender_email.clone(),
      recipient: self.store_manager_email.clone(),
      lead_days: self.alert_lead_days,
    }
  }
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

// ─── Sample data ──────────────────────────────────────────────────────────────

/// Write synthetic insight datasets into `dir`, or the configured data
/// directory when `dir` is `None`.
pub fn generate_sample_data(
  config: &ServerConfig,
  dir: Option<&Path>,
  options: GenerateOptions,
) -> anyhow::Result<LoadSummary> {
  let dir = expand_tilde(dir.unwrap_or(&config.data_dir));
  generate::generate(&dir, options)
    .with_context(|| format!("failed to generate sample data in {dir:?}"))
}

// ─── Services ─────────────────────────────────────────────────────────────────

pub type LiveState = AppState<SqliteStore, GeminiClient, SerperClient>;
pub type LiveAlert = DailyAlert<SqliteStore, GeminiClient, SendGridClient>;

/// Everything the binary runs: the HTTP state and the alert job.
pub struct Services {
  pub state: LiveState,
  pub alert: LiveAlert,
}

/// Open the store, load the insight datasets and construct the API clients.
pub async fn build(config: &ServerConfig) -> anyhow::Result<Services> {
  let store_path = expand_tilde(&config.store_path);
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;
  let store = Arc::new(store);

  let insights = Arc::new(InsightCache::new(expand_tilde(&config.data_dir)));
  let loader = Arc::clone(&insights);
  let loaded = tokio::task::spawn_blocking(move || loader.load())
    .await
    .context("insight loader panicked")?;
  tracing::info!(?loaded, dir = ?insights.dir(), "insight datasets loaded");

  let http = http_client(HTTP_TIMEOUT).context("failed to build HTTP client")?;
  let gemini = Arc::new(GeminiClient::new(
    http.clone(),
    config.gemini_api_key.clone(),
    config.gemini_model.clone(),
  ));
  let serper = Arc::new(SerperClient::new(http.clone(), config.serper_api_key.clone()));
  let sendgrid = Arc::new(SendGridClient::new(http, config.sendgrid_api_key.clone()));

  if !gemini.is_configured() {
    tracing::warn!("no Gemini API key; carbon estimates and the chatbot are disabled");
  }
  if !sendgrid.is_configured() {
    tracing::warn!("no SendGrid API key; expiry alerts will not be sent");
  }

  let expiry = ExpiryAggregator::new(store.clone(), CarbonEstimator::new(gemini.clone()));
  let state = AppState {
    store:                 store.clone(),
    expiry:                expiry.clone(),
    responder:             QueryResponder::new(store, gemini, serper, insights.clone()),
    insights,
    dashboard_window_days: config.dashboard_window_days,
  };
  let alert = DailyAlert::new(expiry, sendgrid, config.alert_config());

  Ok(Services { state, alert })
}

/// The full HTTP application: the JSON API under `/api`, with request tracing.
pub fn router(state: LiveState) -> Router {
  Router::new()
    .nest("/api", larder_api::api_router(state))
    .layer(TraceLayer::new_for_http())
}

// ─── Alert job ────────────────────────────────────────────────────────────────

/// Run `alert` every `period` until `shutdown` is notified.
///
/// The first run happens one full period after start. Missed ticks are
/// skipped rather than bunched up, and a failed run only logs.
pub fn spawn_alert_job<S, G, M>(
  alert: Arc<DailyAlert<S, G, M>>,
  period: Duration,
  shutdown: Arc<Notify>,
) -> JoinHandle<()>
where
  S: InventoryStore + 'static,
  G: TextGenerator + 'static,
  M: Mailer + 'static,
{
  tokio::spawn(async move {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    ticker.tick().await;

    tracing::info!(every = ?period, "expiry alert job scheduled");
    loop {
      tokio::select! {
        _ = shutdown.notified() => {
          tracing::info!("expiry alert job stopping");
          break;
        }
        _ = ticker.tick() => {
          let outcome = alert.run_daily_alert().await;
          tracing::info!(?outcome, "expiry alert job finished");
        }
      }
    }
  })
}
