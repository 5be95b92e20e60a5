//! Larder server binary.
//!
//! Reads `config.toml` (or the path given with `--config`) and `LARDER_*`
//! environment variables, opens the SQLite store, serves the JSON API over
//! HTTP and runs the daily expiry alert in the background. The
//! `generate-data` subcommand writes sample insight datasets instead.

use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use larder_insights::generate::GenerateOptions;
use larder_server::ServerConfig;
use tokio::{net::TcpListener, sync::Notify};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Larder inventory server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Run the expiry alert once and exit instead of serving.
  #[arg(long)]
  alert_now: bool,

  #[command(subcommand)]
  command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
  /// Write synthetic products, customers and transactions CSVs and exit.
  GenerateData {
    /// Output directory; defaults to the configured `data_dir`.
    #[arg(long)]
    dir: Option<PathBuf>,

    #[arg(long, default_value_t = 50)]
    products: usize,

    #[arg(long, default_value_t = 200)]
    customers: usize,

    #[arg(long, default_value_t = 5000)]
    transactions: usize,
  },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();
  let server_cfg = ServerConfig::load(&cli.config)?;

  if let Some(Command::GenerateData { dir, products, customers, transactions }) = cli.command {
    let options = GenerateOptions { products, customers, transactions };
    let written = larder_server::generate_sample_data(&server_cfg, dir.as_deref(), options)?;
    tracing::info!(?written, "sample data written");
    return Ok(());
  }

  let services = larder_server::build(&server_cfg).await?;

  if cli.alert_now {
    let outcome = services.alert.run_daily_alert().await;
    tracing::info!(?outcome, "expiry alert run finished");
    return Ok(());
  }

  let shutdown = Arc::new(Notify::new());
  let job = larder_server::spawn_alert_job(
    Arc::new(services.alert),
    server_cfg.alert_period(),
    shutdown.clone(),
  );

  let app = larder_server::router(services.state);
  let address = server_cfg.address();

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app)
    .with_graceful_shutdown(async {
      if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {e}");
      }
    })
    .await
    .context("server error")?;

  shutdown.notify_one();
  job.await.context("alert job panicked")?;
  Ok(())
}
