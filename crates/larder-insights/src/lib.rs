//! In-memory sales and customer insights for Larder.
//!
//! Three flat CSV datasets (products, customers, transactions) are read once
//! into an [`InsightCache`] and summarised on demand without touching the
//! disk again. The cache is an ordinary value: construct it, call
//! [`InsightCache::load`] at startup, and hand it to whatever needs it.

mod cache;
pub mod dataset;
pub mod error;
pub mod generate;
pub mod summary;

pub use cache::{InsightCache, LoadSummary};
pub use error::{Error, Result, Unavailable};
