//! Product types: the catalogue entries inventory items are stocked against.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// A kind of product the store sells, e.g. "1L Organic Milk".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductType {
  pub id:            i64,
  /// Unique display name, stored title-cased.
  pub name:          String,
  /// Price copied onto every item received for this product.
  pub default_price: f64,
}

/// Validated input to [`crate::store::InventoryStore::create_product_type`].
#[derive(Debug, Clone, PartialEq)]
pub struct NewProductType {
  name:          String,
  default_price: f64,
}

impl NewProductType {
  /// Normalise `name` (trimmed, title-cased) and validate both fields.
  pub fn new(name: &str, default_price: f64) -> Result<Self> {
    let name = title_case(name.trim());
    if name.is_empty() {
      return Err(Error::EmptyName);
    }
    if !default_price.is_finite() || default_price < 0.0 {
      return Err(Error::InvalidPrice(default_price));
    }
    Ok(Self { name, default_price })
  }

  pub fn name(&self) -> &str { &self.name }

  pub fn default_price(&self) -> f64 { self.default_price }
}

/// Uppercase the first letter of every run of letters and lowercase the rest.
///
/// Any non-letter starts a new run, so `"1l organic milk"` becomes
/// `"1L Organic Milk"`.
pub fn title_case(s: &str) -> String {
  let mut out = String::with_capacity(s.len());
  let mut in_word = false;
  for c in s.chars() {
    if c.is_alphabetic() {
      if in_word {
        out.extend(c.to_lowercase());
      } else {
        out.extend(c.to_uppercase());
      }
      in_word = true;
    } else {
      out.push(c);
      in_word = false;
    }
  }
  out
}
