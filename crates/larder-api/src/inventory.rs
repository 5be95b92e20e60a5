//! Handlers for `/inventory` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/inventory` | Every item, unsold first |
//! | `GET`  | `/inventory/export` | Unsold items as a CSV attachment |

use axum::{
  Json,
  extract::State,
  http::header,
  response::IntoResponse,
};
use larder_core::{
  item::StockedItem,
  service::{TextGenerator, WebSearch},
  store::InventoryStore,
};

use crate::{AppState, error::ApiError};

pub const EXPORT_FILENAME: &str = "inventory_report.csv";

const EXPORT_HEADER: [&str; 6] =
  ["RFID_Tag", "Product_Name", "Price", "Stock_In_Date", "Expiry_Date", "Location"];

/// `GET /inventory`
pub async fn list<S, G, W>(
  State(state): State<AppState<S, G, W>>,
) -> Result<Json<Vec<StockedItem>>, ApiError>
where
  S: InventoryStore,
  G: TextGenerator,
  W: WebSearch,
{
  let items = state.store.list_inventory().await.map_err(ApiError::store)?;
  Ok(Json(items))
}

/// Render unsold items as CSV, in the store's name-then-expiry order.
pub fn export_csv(items: &[StockedItem]) -> Result<Vec<u8>, csv::Error> {
  let mut writer = csv::Writer::from_writer(Vec::new());
  writer.write_record(EXPORT_HEADER)?;
  for stocked in items {
    let item = &stocked.item;
    let price = item.price.to_string();
    let stock_in = item.stock_in_date.to_string();
    let expiry = item.expiry_date.to_string();
    writer.write_record([
      item.tag.as_str(),
      stocked.product_name.as_str(),
      price.as_str(),
      stock_in.as_str(),
      expiry.as_str(),
      item.location.as_str(),
    ])?;
  }
  writer.into_inner().map_err(|e| e.into_error().into())
}

/// `GET /inventory/export`
pub async fn export<S, G, W>(
  State(state): State<AppState<S, G, W>>,
) -> Result<impl IntoResponse, ApiError>
where
  S: InventoryStore,
  G: TextGenerator,
  W: WebSearch,
{
  let items = state.store.list_unsold(None).await.map_err(ApiError::store)?;
  let body = export_csv(&items).map_err(|e| ApiError::Internal(e.to_string()))?;
  Ok((
    [
      (header::CONTENT_TYPE, "text/csv".to_owned()),
      (
        header::CONTENT_DISPOSITION,
        format!("attachment; filename=\"{EXPORT_FILENAME}\""),
      ),
    ],
    body,
  ))
}
