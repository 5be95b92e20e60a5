//! Handler for `GET /dashboard`.

use axum::{Json, extract::State};
use chrono::NaiveDate;
use larder_agent::ExpirySummary;
use larder_core::{
  item::ExpiryWindow,
  service::{TextGenerator, WebSearch},
  store::InventoryStore,
};
use serde::Serialize;

use crate::{AppState, error::ApiError};

#[derive(Debug, Serialize)]
pub struct Dashboard {
  pub today:       NaiveDate,
  /// Unsold stock expiring in `[today, today + dashboard_window_days]`.
  pub expiring:    ExpirySummary,
  pub total_items: u64,
  pub total_value: f64,
}

/// `GET /dashboard`
pub async fn handler<S, G, W>(
  State(state): State<AppState<S, G, W>>,
) -> Result<Json<Dashboard>, ApiError>
where
  S: InventoryStore,
  G: TextGenerator,
  W: WebSearch,
{
  let today = chrono::Local::now().date_naive();
  let window = ExpiryWindow::days_from(today, state.dashboard_window_days);
  let expiring = state.expiry.aggregate(window).await.map_err(ApiError::store)?;
  let totals = state.store.stock_totals().await.map_err(ApiError::store)?;
  Ok(Json(Dashboard {
    today,
    expiring,
    total_items: totals.total_items,
    total_value: totals.total_value,
  }))
}
