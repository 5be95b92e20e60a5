//! JSON REST API for Larder.
//!
//! Exposes an axum [`Router`] backed by any [`InventoryStore`] plus the
//! language-model services from `larder-agent`. TLS and transport concerns
//! are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", larder_api::api_router(state))
//! ```

pub mod assistant;
pub mod dashboard;
pub mod error;
pub mod inventory;
pub mod products;
pub mod stock;


use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use larder_agent::{ExpiryAggregator, QueryResponder};
use larder_core::{
  service::{TextGenerator, WebSearch},
  store::InventoryStore,
};
use larder_insights::InsightCache;

pub use error::ApiError;

/// Shared state threaded through all handlers.
pub struct AppState<S, G, W> {
  pub store:                 Arc<S>,
  pub expiry:                ExpiryAggregator<S, G>,
  pub responder:             QueryResponder<S, G, W>,
  pub insights:              Arc<InsightCache>,
  /// The dashboard lists items expiring in `[today, today + n]`.
  pub dashboard_window_days: u32,
}

impl<S, G, W> Clone for AppState<S, G, W> {
  fn clone(&self) -> Self {
    Self {
      store:                 self.store.clone(),
      expiry:                self.expiry.clone(),
      responder:             self.responder.clone(),
      insights:              self.insights.clone(),
      dashboard_window_days: self.dashboard_window_days,
    }
  }
}

/// Build a fully-materialised API router for `state`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S, G, W>(state: AppState<S, G, W>) -> Router<()>
where
  S: InventoryStore + 'static,
  G: TextGenerator + 'static,
  W: WebSearch + 'static,
{
  Router::new()
    .route("/dashboard", get(dashboard::handler::<S, G, W>))
    // Product types
    .route(
      "/product-types",
      get(products::list::<S, G, W>).post(products::create::<S, G, W>),
    )
    .route(
      "/product-types/{id}",
      get(products::get_one::<S, G, W>).delete(products::delete_one::<S, G, W>),
    )
    // Stock movements
    .route("/stock", post(stock::receive::<S, G, W>))
    .route("/sales", post(stock::sell::<S, G, W>))
    // Inventory
    .route("/inventory", get(inventory::list::<S, G, W>))
    .route("/inventory/export", get(inventory::export::<S, G, W>))
    // Assistant
    .route("/carbon", get(assistant::carbon::<S, G, W>))
    .route("/chatbot", post(assistant::chatbot::<S, G, W>))
    .route("/insights/reload", post(assistant::reload_insights::<S, G, W>))
    .with_state(state)
}
