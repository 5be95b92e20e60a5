//! Row types and readers for the three CSV datasets.
//!
//! Only the columns the summaries use are declared; any other columns in
//! the files are ignored.

use std::{io::Read, path::Path};

use serde::{Deserialize, de::DeserializeOwned};

use crate::{Error, Result};

pub const PRODUCTS_FILE: &str = "products.csv";
pub const CUSTOMERS_FILE: &str = "customers.csv";
pub const TRANSACTIONS_FILE: &str = "transactions.csv";

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProductRecord {
  #[serde(rename = "ProductID")]
  pub product_id:   i64,
  #[serde(rename = "ProductName")]
  pub product_name: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CustomerRecord {
  #[serde(rename = "CustomerID")]
  pub customer_id: i64,
  /// `None` when the cell is blank or not a whole number. Such customers
  /// still count towards the gender split.
  #[serde(rename = "Age", deserialize_with = "csv::invalid_option")]
  pub age:         Option<i64>,
  #[serde(rename = "Gender")]
  pub gender:      String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TransactionRecord {
  #[serde(rename = "TransactionID")]
  pub transaction_id: i64,
  #[serde(rename = "CustomerID")]
  pub customer_id:    i64,
  #[serde(rename = "ProductID")]
  pub product_id:     i64,
  #[serde(rename = "Quantity")]
  pub quantity:       u64,
}

/// Everything the summaries operate on. Each dataset is independently
/// optional so that, e.g., a missing customers file does not hide sales.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Datasets {
  pub products:     Option<Vec<ProductRecord>>,
  pub customers:    Option<Vec<CustomerRecord>>,
  pub transactions: Option<Vec<TransactionRecord>>,
}

/// Deserialize every row of a headered CSV stream.
pub fn read_records<T, R>(reader: R) -> csv::Result<Vec<T>>
where
  T: DeserializeOwned,
  R: Read,
{
  csv::ReaderBuilder::new()
    .trim(csv::Trim::All)
    .from_reader(reader)
    .deserialize()
    .collect()
}

/// Read one dataset file from `dir`.
pub fn read_file<T: DeserializeOwned>(dir: &Path, file: &str) -> Result<Vec<T>> {
  let path = dir.join(file);
  let reader = std::fs::File::open(&path)
    .map_err(csv::Error::from)
    .map_err(|source| Error::Csv { path: path.clone(), source })?;
  read_records(reader).map_err(|source| Error::Csv { path, source })
}
