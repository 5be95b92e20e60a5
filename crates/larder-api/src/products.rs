//! Handlers for `/product-types` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/product-types` | Ordered by id |
//! | `POST`   | `/product-types` | Body: `{"name":"milk","default_price":1.2}`; 409 on duplicate name |
//! | `GET`    | `/product-types/:id` | 404 if not found |
//! | `DELETE` | `/product-types/:id` | Removes its items too; 204 |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use larder_core::{
  product::{NewProductType, ProductType},
  service::{TextGenerator, WebSearch},
  store::InventoryStore,
};
use serde::Deserialize;

use crate::{AppState, error::ApiError};

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /product-types`
pub async fn list<S, G, W>(
  State(state): State<AppState<S, G, W>>,
) -> Result<Json<Vec<ProductType>>, ApiError>
where
  S: InventoryStore,
  G: TextGenerator,
  W: WebSearch,
{
  let products = state.store.list_product_types().await.map_err(ApiError::store)?;
  Ok(Json(products))
}

// ─── Create ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub name:          String,
  pub default_price: f64,
}

/// `POST /product-types`
pub async fn create<S, G, W>(
  State(state): State<AppState<S, G, W>>,
  Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: InventoryStore,
  G: TextGenerator,
  W: WebSearch,
{
  let input = NewProductType::new(&body.name, body.default_price)?;
  let product = state.store.create_product_type(input).await.map_err(ApiError::store)?;
  tracing::info!(id = product.id, name = %product.name, "product type created");
  Ok((StatusCode::CREATED, Json(product)))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /product-types/:id`
pub async fn get_one<S, G, W>(
  State(state): State<AppState<S, G, W>>,
  Path(id): Path<i64>,
) -> Result<Json<ProductType>, ApiError>
where
  S: InventoryStore,
  G: TextGenerator,
  W: WebSearch,
{
  let product = state
    .store
    .get_product_type(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("product type {id} not found")))?;
  Ok(Json(product))
}

// ─── Delete ───────────────────────────────────────────────────────────────────

/// `DELETE /product-types/:id`
pub async fn delete_one<S, G, W>(
  State(state): State<AppState<S, G, W>>,
  Path(id): Path<i64>,
) -> Result<StatusCode, ApiError>
where
  S: InventoryStore,
  G: TextGenerator,
  W: WebSearch,
{
  let removed = state.store.delete_product_type(id).await.map_err(ApiError::store)?;
  tracing::info!(id, removed, "product type deleted");
  Ok(StatusCode::NO_CONTENT)
}
