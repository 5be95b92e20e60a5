//! The `InventoryStore` trait.
//!
//! Implemented by storage backends (e.g. `larder-store-sqlite`). The agent
//! and HTTP layers depend on this abstraction, not on a concrete backend.

use std::future::Future;

use crate::{
  error::DomainError,
  item::{ExpiryWindow, InventoryItem, StockReceipt, StockTotals, StockedItem},
  product::{NewProductType, ProductType},
};

/// Abstraction over the relational inventory store.
///
/// All methods return `Send` futures so the trait can be used from axum
/// handlers and spawned tasks alike.
pub trait InventoryStore: Send + Sync {
  type Error: std::error::Error + DomainError + Send + Sync + 'static;

  // ── Product types ─────────────────────────────────────────────────────

  /// Persist a new product type. Fails with
  /// [`Error::DuplicateProductType`](crate::Error::DuplicateProductType) if
  /// the name is taken.
  fn create_product_type(
    &self,
    input: NewProductType,
  ) -> impl Future<Output = Result<ProductType, Self::Error>> + Send + '_;

  /// All product types, ordered by id.
  fn list_product_types(
    &self,
  ) -> impl Future<Output = Result<Vec<ProductType>, Self::Error>> + Send + '_;

  fn get_product_type(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<Option<ProductType>, Self::Error>> + Send + '_;

  /// Delete a product type together with all of its items. Returns the
  /// number of items removed.
  fn delete_product_type(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  // ── Items ─────────────────────────────────────────────────────────────

  /// Create one item per unit in `receipt`, each with a fresh unique tag and
  /// the product's default price. All-or-nothing.
  fn receive_stock(
    &self,
    receipt: StockReceipt,
  ) -> impl Future<Output = Result<Vec<InventoryItem>, Self::Error>> + Send + '_;

  /// Mark the item with `tag` as sold now.
  fn sell(
    &self,
    tag: String,
  ) -> impl Future<Output = Result<StockedItem, Self::Error>> + Send + '_;

  // ── Reads ─────────────────────────────────────────────────────────────

  /// Every item, in stock first, then by product name and expiry date.
  fn list_inventory(
    &self,
  ) -> impl Future<Output = Result<Vec<StockedItem>, Self::Error>> + Send + '_;

  /// Unsold items, optionally restricted to an expiry window; ordered by
  /// product name, expiry date and id.
  fn list_unsold(
    &self,
    window: Option<ExpiryWindow>,
  ) -> impl Future<Output = Result<Vec<StockedItem>, Self::Error>> + Send + '_;

  /// Count and summed price of unsold items.
  fn stock_totals(
    &self,
  ) -> impl Future<Output = Result<StockTotals, Self::Error>> + Send + '_;
}
