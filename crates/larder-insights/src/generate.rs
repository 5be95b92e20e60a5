//! Synthetic datasets for a fresh install.
//!
//! Writes `products.csv`, `customers.csv` and `transactions.csv` with the
//! full column sets the insight readers expect, so the summaries have
//! something to show before real sales data exists.

use std::path::Path;

use chrono::{Datelike, Days, NaiveDate, NaiveDateTime, TimeDelta};
use rand::Rng;
use serde::Serialize;

use crate::{
  Error, LoadSummary, Result,
  dataset::{CUSTOMERS_FILE, PRODUCTS_FILE, TRANSACTIONS_FILE},
};

const PRODUCT_NAMES: [&str; 10] = [
  "Organic Milk 1L",
  "Cheddar Cheese 250g",
  "Sourdough Bread",
  "Free-Range Eggs (12)",
  "Granny Smith Apples",
  "Chicken Breast 500g",
  "Basmati Rice 1kg",
  "Organic Tomatoes",
  "Avocado",
  "Dark Chocolate Bar",
];
const CATEGORIES: [&str; 6] = ["Dairy", "Bakery", "Produce", "Meat", "Pantry", "Snacks"];
const GENDERS: [&str; 3] = ["Male", "Female", "Other"];
const FIRST_NAMES: [&str; 12] = [
  "Ava", "Ben", "Chloe", "Dev", "Elena", "Farid", "Grace", "Hiro", "Ines", "Jonah", "Kemi",
  "Liam",
];
const LAST_NAMES: [&str; 10] = [
  "Okafor", "Schmidt", "Nguyen", "Silva", "Patel", "Kowalski", "Haddad", "Larsen", "Moreau",
  "Tanaka",
];

/// Row counts to generate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerateOptions {
  pub products:     usize,
  pub customers:    usize,
  pub transactions: usize,
}

impl Default for GenerateOptions {
  fn default() -> Self { Self { products: 50, customers: 200, transactions: 5000 } }
}

#[derive(Serialize)]
struct ProductRow {
  #[serde(rename = "ProductID")]
  product_id:    usize,
  #[serde(rename = "ProductName")]
  product_name:  String,
  #[serde(rename = "Category")]
  category:      &'static str,
  #[serde(rename = "CostPrice")]
  cost_price:    f64,
  #[serde(rename = "SellingPrice")]
  selling_price: f64,
}

#[derive(Serialize)]
struct CustomerRow {
  #[serde(rename = "CustomerID")]
  customer_id: usize,
  #[serde(rename = "Name")]
  name:        String,
  #[serde(rename = "Age")]
  age:         u32,
  #[serde(rename = "Gender")]
  gender:      &'static str,
  #[serde(rename = "JoinDate")]
  join_date:   NaiveDate,
}

#[derive(Serialize)]
struct TransactionRow {
  #[serde(rename = "TransactionID")]
  transaction_id:   usize,
  #[serde(rename = "CustomerID")]
  customer_id:      usize,
  #[serde(rename = "ProductID")]
  product_id:       usize,
  #[serde(rename = "Quantity")]
  quantity:         u32,
  #[serde(rename = "TransactionDate")]
  transaction_date: String,
}

fn pick<R: Rng + ?Sized, T: Copy>(rng: &mut R, items: &[T]) -> T {
  items[rng.random_range(0..items.len())]
}

fn price<R: Rng + ?Sized>(rng: &mut R, low: f64, high: f64) -> f64 {
  (rng.random_range(low..high) * 100.0).round() / 100.0
}

fn write_rows<T: Serialize>(dir: &Path, file: &str, rows: Vec<T>) -> Result<()> {
  let path = dir.join(file);
  let wrap = |source: csv::Error| Error::Write { path: path.clone(), source };

  let mut writer = csv::Writer::from_path(&path).map_err(wrap)?;
  for row in rows {
    writer.serialize(row).map_err(wrap)?;
  }
  writer.flush().map_err(csv::Error::from).map_err(wrap)?;
  Ok(())
}

/// Write all three datasets into `dir`, drawing values from `rng`.
///
/// Product names carry a `vN` suffix so each id is distinct; customers are
/// 18 to 69 and joined this decade; transactions are 1 to 4 units within the
/// year before `now`. Existing files are overwritten.
pub fn generate_with<R: Rng + ?Sized>(
  dir: &Path,
  options: GenerateOptions,
  now: NaiveDateTime,
  rng: &mut R,
) -> Result<LoadSummary> {
  std::fs::create_dir_all(dir)
    .map_err(csv::Error::from)
    .map_err(|source| Error::Write { path: dir.to_path_buf(), source })?;

  let products: Vec<ProductRow> = (1..=options.products)
    .map(|id| ProductRow {
      product_id:    id,
      product_name:  format!("{} v{id}", pick(rng, &PRODUCT_NAMES)),
      category:      pick(rng, &CATEGORIES),
      cost_price:    price(rng, 1.0, 15.0),
      selling_price: price(rng, 2.0, 30.0),
    })
    .collect();
  write_rows(dir, PRODUCTS_FILE, products)?;

  let today = now.date();
  let decade_start =
    NaiveDate::from_ymd_opt(today.year() - today.year().rem_euclid(10), 1, 1).unwrap_or(today);
  let decade_days = (today - decade_start).num_days().max(0) as u64;
  let customers: Vec<CustomerRow> = (1..=options.customers)
    .map(|id| CustomerRow {
      customer_id: id,
      name:        format!("{} {}", pick(rng, &FIRST_NAMES), pick(rng, &LAST_NAMES)),
      age:         rng.random_range(18..70),
      gender:      pick(rng, &GENDERS),
      join_date:   decade_start
        .checked_add_days(Days::new(rng.random_range(0..=decade_days)))
        .unwrap_or(today),
    })
    .collect();
  write_rows(dir, CUSTOMERS_FILE, customers)?;

  let transactions: Vec<TransactionRow> = if options.products == 0 || options.customers == 0 {
    Vec::new()
  } else {
    (1..=options.transactions)
      .map(|id| {
        let when = now - TimeDelta::days(rng.random_range(0..=365));
        TransactionRow {
          transaction_id:   id,
          customer_id:      rng.random_range(1..=options.customers),
          product_id:       rng.random_range(1..=options.products),
          quantity:         rng.random_range(1..5),
          transaction_date: when.format("%Y-%m-%d %H:%M:%S").to_string(),
        }
      })
      .collect()
  };
  let transaction_count = transactions.len();
  write_rows(dir, TRANSACTIONS_FILE, transactions)?;

  tracing::info!(dir = %dir.display(), "generated sample insight datasets");
  Ok(LoadSummary {
    products:     Some(options.products),
    customers:    Some(options.customers),
    transactions: Some(transaction_count),
  })
}

/// [`generate_with`] using the thread-local generator and the local clock.
pub fn generate(dir: &Path, options: GenerateOptions) -> Result<LoadSummary> {
  generate_with(dir, options, chrono::Local::now().naive_local(), &mut rand::rng())
}
