//! Handlers backed by the language model and the insight datasets.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/carbon?product=...` | `kg_co2e` is `null` when no estimate is available |
//! | `POST` | `/chatbot` | Body: `{"question":"..."}`; always 200 with an answer |
//! | `POST` | `/insights/reload` | Re-reads the CSV datasets |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Query, State},
};
use larder_core::{
  service::{TextGenerator, WebSearch},
  store::InventoryStore,
};
use larder_insights::LoadSummary;
use serde::{Deserialize, Serialize};

use crate::{AppState, error::ApiError};

// ─── Carbon ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CarbonParams {
  pub product: String,
}

#[derive(Debug, Serialize)]
pub struct CarbonEstimate {
  pub product: String,
  pub kg_co2e: Option<f64>,
}

/// `GET /carbon?product=<name>`
pub async fn carbon<S, G, W>(
  State(state): State<AppState<S, G, W>>,
  Query(params): Query<CarbonParams>,
) -> Result<Json<CarbonEstimate>, ApiError>
where
  S: InventoryStore,
  G: TextGenerator,
  W: WebSearch,
{
  let product = params.product.trim();
  if product.is_empty() {
    return Err(ApiError::BadRequest("product must not be empty".into()));
  }
  let kg_co2e = state.expiry.estimator().estimate(product).await;
  Ok(Json(CarbonEstimate { product: product.to_owned(), kg_co2e }))
}

// ─── Chatbot ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
  pub question: String,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
  pub answer: String,
}

/// `POST /chatbot`
pub async fn chatbot<S, G, W>(
  State(state): State<AppState<S, G, W>>,
  Json(body): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError>
where
  S: InventoryStore,
  G: TextGenerator,
  W: WebSearch,
{
  if body.question.trim().is_empty() {
    return Err(ApiError::BadRequest("question must not be empty".into()));
  }
  let answer = state.responder.answer(&body.question).await;
  Ok(Json(ChatResponse { answer }))
}

// ─── Insights ─────────────────────────────────────────────────────────────────

/// `POST /insights/reload`
pub async fn reload_insights<S, G, W>(
  State(state): State<AppState<S, G, W>>,
) -> Result<Json<LoadSummary>, ApiError>
where
  S: InventoryStore,
  G: TextGenerator,
  W: WebSearch,
{
  let insights = Arc::clone(&state.insights);
  let loaded = tokio::task::spawn_blocking(move || insights.load())
    .await
    .map_err(|e| ApiError::Internal(format!("insight reload task failed: {e}")))?;
  tracing::info!(?loaded, "insight datasets reloaded");
  Ok(Json(loaded))
}
