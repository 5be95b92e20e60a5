//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Calendar dates are stored as `YYYY-MM-DD` so they order correctly as
//! text. Timestamps are stored as RFC 3339 strings.

use chrono::{DateTime, NaiveDate, Utc};
use larder_core::{
  item::{InventoryItem, StockedItem},
  product::ProductType,
};

use crate::{Error, Result};

// ─── NaiveDate ───────────────────────────────────────────────────────────────

const DATE_FORMAT: &str = "%Y-%m-%d";

pub fn encode_date(d: NaiveDate) -> String { d.format(DATE_FORMAT).to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, DATE_FORMAT)
    .map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Column list matching [`RawStockedItem::from_row`]; expects the items table
/// aliased as `i` and product types as `p`.
pub const STOCKED_ITEM_COLUMNS: &str = "i.id, i.tag, i.price, i.stock_in_date, \
   i.expiry_date, i.location, i.product_type_id, i.sold_at, p.name";

/// Raw values read from an `inventory_items` row joined with its product.
pub struct RawStockedItem {
  pub id:              i64,
  pub tag:             String,
  pub price:           f64,
  pub stock_in_date:   String,
  pub expiry_date:     String,
  pub location:        String,
  pub product_type_id: i64,
  pub sold_at:         Option<String>,
  pub product_name:    String,
}

impl RawStockedItem {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:              row.get(0)?,
      tag:             row.get(1)?,
      price:           row.get(2)?,
      stock_in_date:   row.get(3)?,
      expiry_date:     row.get(4)?,
      location:        row.get(5)?,
      product_type_id: row.get(6)?,
      sold_at:         row.get(7)?,
      product_name:    row.get(8)?,
    })
  }

  pub fn into_stocked(self) -> Result<StockedItem> {
    let item = InventoryItem {
      id:              self.id,
      tag:             self.tag,
      price:           self.price,
      stock_in_date:   decode_date(&self.stock_in_date)?,
      expiry_date:     decode_date(&self.expiry_date)?,
      location:        self.location,
      product_type_id: self.product_type_id,
      sold_at:         self.sold_at.as_deref().map(decode_dt).transpose()?,
    };
    Ok(StockedItem { product_name: self.product_name, item })
  }
}

pub fn product_type_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ProductType> {
  Ok(ProductType {
    id:            row.get(0)?,
    name:          row.get(1)?,
    default_price: row.get(2)?,
  })
}
