//! Inventory items: one row per physical unit on the shelf.
//!
//! An item is created when stock is received and changes exactly once, when
//! it is sold. It is never deleted except together with its product type.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

// ─── Item ────────────────────────────────────────────────────────────────────

/// A single tagged unit of a [`ProductType`](crate::product::ProductType).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryItem {
  pub id:              i64,
  /// Unique tag printed on the unit (`{product_id}-{unix_seconds}-{seq}`).
  pub tag:             String,
  /// Copied from the product's default price at receipt; may diverge later.
  pub price:           f64,
  pub stock_in_date:   NaiveDate,
  pub expiry_date:     NaiveDate,
  pub location:        String,
  pub product_type_id: i64,
  /// Set exactly when the item is sold. `None` means the item is in stock.
  pub sold_at:         Option<DateTime<Utc>>,
}

impl InventoryItem {
  pub fn is_sold(&self) -> bool { self.sold_at.is_some() }
}

/// An item joined with the name of its product type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockedItem {
  pub product_name: String,
  #[serde(flatten)]
  pub item:         InventoryItem,
}

// ─── Stock receipt ───────────────────────────────────────────────────────────

/// Upper bound on units in a single receipt.
pub const MAX_RECEIPT_QUANTITY: u32 = 10_000;

/// Validated input to [`crate::store::InventoryStore::receive_stock`].
#[derive(Debug, Clone, PartialEq)]
pub struct StockReceipt {
  product_type_id: i64,
  quantity:        u32,
  stock_in_date:   NaiveDate,
  expiry_date:     NaiveDate,
  location:        String,
}

impl StockReceipt {
  pub fn new(
    product_type_id: i64,
    quantity: u32,
    stock_in_date: NaiveDate,
    expiry_date: NaiveDate,
    location: &str,
  ) -> Result<Self> {
    if quantity == 0 {
      return Err(Error::InvalidQuantity(quantity));
    }
    if quantity > MAX_RECEIPT_QUANTITY {
      return Err(Error::QuantityTooLarge(quantity));
    }
    let location = location.trim();
    if location.is_empty() {
      return Err(Error::EmptyLocation);
    }
    Ok(Self {
      product_type_id,
      quantity,
      stock_in_date,
      expiry_date,
      location: location.to_owned(),
    })
  }

  pub fn product_type_id(&self) -> i64 { self.product_type_id }

  pub fn quantity(&self) -> u32 { self.quantity }

  pub fn stock_in_date(&self) -> NaiveDate { self.stock_in_date }

  pub fn expiry_date(&self) -> NaiveDate { self.expiry_date }

  pub fn location(&self) -> &str { &self.location }
}

// ─── Tags ────────────────────────────────────────────────────────────────────

/// The part of a tag shared by every unit received for `product_type_id`
/// within the same second.
pub fn tag_prefix(product_type_id: i64, received_at: DateTime<Utc>) -> String {
  format!("{product_type_id}-{}-", received_at.timestamp())
}

/// Parse the trailing sequence number out of a tag, if it has one.
pub fn tag_sequence(tag: &str) -> Option<u32> {
  tag.rsplit_once('-').and_then(|(_, seq)| seq.parse().ok())
}

// ─── Queries ─────────────────────────────────────────────────────────────────

/// An inclusive range of expiry dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpiryWindow {
  pub from:  NaiveDate,
  pub until: NaiveDate,
}

impl ExpiryWindow {
  pub fn new(from: NaiveDate, until: NaiveDate) -> Self { Self { from, until } }

  /// A window covering exactly one day.
  pub fn on(day: NaiveDate) -> Self { Self { from: day, until: day } }

  /// `[today, today + days]`.
  pub fn days_from(today: NaiveDate, days: u32) -> Self {
    let until = today
      .checked_add_days(chrono::Days::new(u64::from(days)))
      .unwrap_or(NaiveDate::MAX);
    Self { from: today, until }
  }

  pub fn contains(&self, date: NaiveDate) -> bool {
    self.from <= date && date <= self.until
  }
}

/// Count and summed price of all unsold items.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct StockTotals {
  pub total_items: u64,
  pub total_value: f64,
}
