//! [`InsightCache`]: a process-lifetime snapshot of the CSV datasets.

use std::{
  fmt::Write as _,
  path::{Path, PathBuf},
  sync::{Arc, PoisonError, RwLock},
};

use serde::Serialize;

use crate::{
  Unavailable,
  dataset::{self, CUSTOMERS_FILE, Datasets, PRODUCTS_FILE, TRANSACTIONS_FILE},
  summary::{self, AgeDistribution, GenderCount, SlowMover, TopSeller},
};

/// Row counts of the datasets installed by the last load; `None` where a
/// file could not be read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LoadSummary {
  pub products:     Option<usize>,
  pub customers:    Option<usize>,
  pub transactions: Option<usize>,
}

/// Read-mostly cache of the product, customer and transaction datasets.
///
/// Readers take a cheap `Arc` clone of the current snapshot; [`load`]
/// replaces the snapshot wholesale, so a reload never exposes a half-read
/// state.
///
/// [`load`]: InsightCache::load
#[derive(Debug)]
pub struct InsightCache {
  dir:      PathBuf,
  snapshot: RwLock<Arc<Datasets>>,
}

impl InsightCache {
  /// An empty cache that will read its files from `dir`. Nothing is read
  /// until [`InsightCache::load`] is called.
  pub fn new(dir: impl Into<PathBuf>) -> Self {
    Self { dir: dir.into(), snapshot: RwLock::new(Arc::new(Datasets::default())) }
  }

  /// A cache pre-populated with `datasets`; [`InsightCache::load`] will
  /// still read from `dir`.
  pub fn with_datasets(dir: impl Into<PathBuf>, datasets: Datasets) -> Self {
    Self { dir: dir.into(), snapshot: RwLock::new(Arc::new(datasets)) }
  }

  pub fn dir(&self) -> &Path { &self.dir }

  /// (Re)read all three datasets and install them as the current snapshot.
  ///
  /// A file that cannot be read is logged and left unavailable; the other
  /// datasets are still installed.
  pub fn load(&self) -> LoadSummary {
    fn attempt<T: serde::de::DeserializeOwned>(dir: &Path, file: &str) -> Option<Vec<T>> {
      match dataset::read_file(dir, file) {
        Ok(rows) => Some(rows),
        Err(e) => {
          tracing::warn!("{e}; related insights will be unavailable");
          None
        }
      }
    }

    let datasets = Datasets {
      products:     attempt(&self.dir, PRODUCTS_FILE),
      customers:    attempt(&self.dir, CUSTOMERS_FILE),
      transactions: attempt(&self.dir, TRANSACTIONS_FILE),
    };
    let loaded = LoadSummary {
      products:     datasets.products.as_ref().map(Vec::len),
      customers:    datasets.customers.as_ref().map(Vec::len),
      transactions: datasets.transactions.as_ref().map(Vec::len),
    };

    *self.snapshot.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(datasets);
    tracing::info!(
      dir = %self.dir.display(),
      products = ?loaded.products,
      customers = ?loaded.customers,
      transactions = ?loaded.transactions,
      "insight datasets loaded"
    );
    loaded
  }

  fn snapshot(&self) -> Arc<Datasets> {
    self.snapshot.read().unwrap_or_else(PoisonError::into_inner).clone()
  }

  // ── Summaries ─────────────────────────────────────────────────────────────

  pub fn top_sellers(&self) -> Result<Vec<TopSeller>, Unavailable> {
    let snap = self.snapshot();
    match (&snap.products, &snap.transactions) {
      (Some(p), Some(t)) => Ok(summary::top_sellers(p, t)),
      _ => Err(Unavailable::Sales),
    }
  }

  pub fn slow_movers(&self) -> Result<Vec<SlowMover>, Unavailable> {
    let snap = self.snapshot();
    match (&snap.products, &snap.transactions) {
      (Some(p), Some(t)) => Ok(summary::slow_movers(p, t)),
      _ => Err(Unavailable::Sales),
    }
  }

  pub fn age_distribution(&self) -> Result<AgeDistribution, Unavailable> {
    let snap = self.snapshot();
    snap
      .customers
      .as_deref()
      .map(summary::age_distribution)
      .ok_or(Unavailable::Customers)
  }

  pub fn gender_distribution(&self) -> Result<Vec<GenderCount>, Unavailable> {
    let snap = self.snapshot();
    snap
      .customers
      .as_deref()
      .map(summary::gender_distribution)
      .ok_or(Unavailable::Customers)
  }

  // ── Text reports ──────────────────────────────────────────────────────────

  /// Top sellers and slow movers as a plain-text block, or the
  /// "not available" sentence.
  pub fn sales_report(&self) -> String {
    let (top, slow) = match (self.top_sellers(), self.slow_movers()) {
      (Ok(top), Ok(slow)) => (top, slow),
      (Err(e), _) | (_, Err(e)) => return e.to_string(),
    };

    let mut out = String::from("Top Sellers:\n");
    write_rows(
      &mut out,
      ("ProductName", "Quantity"),
      top.iter().map(|t| (&t.name, t.quantity)),
    );
    out.push_str("\nSlow Movers:\n");
    if slow.is_empty() {
      out.push_str("(none)\n");
    } else {
      write_rows(
        &mut out,
        ("ProductName", "UnitsSold"),
        slow.iter().map(|s| (&s.name, s.units_sold)),
      );
    }
    out
  }

  /// Age and gender distributions as a plain-text block, or the
  /// "not available" sentence.
  pub fn customer_report(&self) -> String {
    let (ages, genders) = match (self.age_distribution(), self.gender_distribution()) {
      (Ok(a), Ok(g)) => (a, g),
      (Err(e), _) | (_, Err(e)) => return e.to_string(),
    };

    let mut out = String::from("Customer Ages:\n");
    write_rows(
      &mut out,
      ("Age_Group", "Count"),
      ages.buckets.iter().map(|(b, n)| (b.label(), *n)),
    );
    out.push_str("\nCustomer Genders:\n");
    write_rows(
      &mut out,
      ("Gender", "Count"),
      genders.iter().map(|g| (&g.gender, g.count)),
    );
    out
  }
}

/// Two left-aligned columns, padded to the widest label.
fn write_rows<L: AsRef<str>>(
  out: &mut String,
  header: (&str, &str),
  rows: impl Iterator<Item = (L, u64)>,
) {
  let rows: Vec<(L, u64)> = rows.collect();
  let width = rows
    .iter()
    .map(|(l, _)| l.as_ref().len())
    .chain(std::iter::once(header.0.len()))
    .max()
    .unwrap_or(0);

  let _ = writeln!(out, "{:<width$}  {}", header.0, header.1);
  for (label, n) in &rows {
    let _ = writeln!(out, "{:<width$}  {n}", label.as_ref());
  }
}

#[cfg(test)]
mod tests {
  use std::fs;

  use super::*;
  use crate::summary::AgeBucket;

  fn write_fixtures(dir: &Path) {
    fs::write(
      dir.join(PRODUCTS_FILE),
      "ProductID,ProductName,Category\n1,Avocado v1,Produce\n2,Sourdough Bread v2,Bakery\n",
    )
    .unwrap();
    fs::write(
      dir.join(CUSTOMERS_FILE),
      "CustomerID,Name,Age,Gender\n1,Ann,22,Female\n2,Bo,30,Male\n3,Cy,64,Female\n",
    )
    .unwrap();
    fs::write(
      dir.join(TRANSACTIONS_FILE),
      "TransactionID,CustomerID,ProductID,Quantity\n1,1,1,3\n2,2,2,1\n3,3,1,2\n",
    )
    .unwrap();
  }

  #[test]
  fn unloaded_cache_reports_sentinels() {
    let cache = InsightCache::new("/nonexistent");
    assert_eq!(cache.top_sellers(), Err(Unavailable::Sales));
    assert_eq!(cache.slow_movers(), Err(Unavailable::Sales));
    assert_eq!(cache.age_distribution(), Err(Unavailable::Customers));
    assert_eq!(cache.gender_distribution(), Err(Unavailable::Customers));
    assert_eq!(cache.sales_report(), "Sales data is not available.");
    assert_eq!(cache.customer_report(), "Customer data is not available.");
  }

  #[test]
  fn load_reads_all_three_files() {
    let dir = tempfile::tempdir().unwrap();
    write_fixtures(dir.path());

    let cache = InsightCache::new(dir.path());
    let loaded = cache.load();
    assert_eq!(loaded, LoadSummary {
      products:     Some(2),
      customers:    Some(3),
      transactions: Some(3),
    });

    let top = cache.top_sellers().unwrap();
    assert_eq!(top[0], TopSeller { name: "Avocado v1".into(), quantity: 5 });

    let report = cache.sales_report();
    assert!(report.starts_with("Top Sellers:\n"), "{report}");
    assert!(report.contains("Slow Movers:"), "{report}");
    assert!(report.contains("Sourdough Bread v2"), "{report}");

    let customers = cache.customer_report();
    assert!(customers.contains("31-45"), "{customers}");
    assert!(customers.contains("Female"), "{customers}");
  }

  #[test]
  fn missing_file_only_disables_its_own_insights() {
    let dir = tempfile::tempdir().unwrap();
    write_fixtures(dir.path());
    fs::remove_file(dir.path().join(CUSTOMERS_FILE)).unwrap();

    let cache = InsightCache::new(dir.path());
    let loaded = cache.load();
    assert_eq!(loaded.customers, None);
    assert!(cache.top_sellers().is_ok());
    assert_eq!(cache.age_distribution(), Err(Unavailable::Customers));
  }

  #[test]
  fn bad_ages_are_excluded_not_fatal() {
    let dir = tempfile::tempdir().unwrap();
    write_fixtures(dir.path());
    fs::write(
      dir.path().join(CUSTOMERS_FILE),
      "CustomerID,Age,Gender\n1,25,Female\n2,40,Male\n3,-1,Male\n4,,Other\n",
    )
    .unwrap();

    let cache = InsightCache::new(dir.path());
    assert_eq!(cache.load().customers, Some(4));

    let ages = cache.age_distribution().unwrap();
    assert_eq!(ages.count(AgeBucket::From18To30), 1);
    assert_eq!(ages.count(AgeBucket::From31To45), 1);
    assert_eq!(ages.excluded, 2);

    let genders = cache.gender_distribution().unwrap();
    assert_eq!(genders.iter().map(|g| g.count).sum::<u64>(), 4);

    let report = cache.customer_report();
    assert!(report.starts_with("Customer Ages:\n"), "{report}");
    assert!(report.contains("Other"), "{report}");
  }

  #[test]
  fn reload_replaces_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let cache = InsightCache::new(dir.path());
    cache.load();
    assert!(cache.top_sellers().is_err());

    write_fixtures(dir.path());
    cache.load();
    assert!(cache.top_sellers().is_ok());
  }
}
