//! Handlers for stock movements.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/stock` | Body: [`ReceiveBody`]; returns 201 + created items |
//! | `POST` | `/sales` | Body: `{"tag":"..."}`; 404 unknown tag, 409 already sold |

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use chrono::NaiveDate;
use larder_core::{
  item::{StockReceipt, StockedItem},
  service::{TextGenerator, WebSearch},
  store::InventoryStore,
};
use serde::Deserialize;

use crate::{AppState, error::ApiError};

// ─── Receive ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ReceiveBody {
  pub product_type_id: i64,
  pub quantity:        u32,
  /// Defaults to today.
  pub stock_in_date:   Option<NaiveDate>,
  pub expiry_date:     NaiveDate,
  pub location:        String,
}

/// `POST /stock`
pub async fn receive<S, G, W>(
  State(state): State<AppState<S, G, W>>,
  Json(body): Json<ReceiveBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: InventoryStore,
  G: TextGenerator,
  W: WebSearch,
{
  let stock_in = body
    .stock_in_date
    .unwrap_or_else(|| chrono::Local::now().date_naive());
  let receipt = StockReceipt::new(
    body.product_type_id,
    body.quantity,
    stock_in,
    body.expiry_date,
    &body.location,
  )?;

  let items = state.store.receive_stock(receipt).await.map_err(ApiError::store)?;
  tracing::info!(
    product_type_id = body.product_type_id,
    count = items.len(),
    "stock received"
  );
  Ok((StatusCode::CREATED, Json(items)))
}

// ─── Sell ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SellBody {
  pub tag: String,
}

/// `POST /sales`
pub async fn sell<S, G, W>(
  State(state): State<AppState<S, G, W>>,
  Json(body): Json<SellBody>,
) -> Result<Json<StockedItem>, ApiError>
where
  S: InventoryStore,
  G: TextGenerator,
  W: WebSearch,
{
  let sold = state.store.sell(body.tag).await.map_err(ApiError::store)?;
  tracing::info!(tag = %sold.item.tag, product = %sold.product_name, "item sold");
  Ok(Json(sold))
}
