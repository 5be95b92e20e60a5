//! Expiry aggregation: which products are about to go off, and what wasting
//! them would cost in CO2e.

use std::{collections::BTreeMap, sync::Arc};

use chrono::NaiveDate;
use larder_core::{
  item::{ExpiryWindow, StockedItem},
  service::TextGenerator,
  store::InventoryStore,
};
use serde::Serialize;

use crate::carbon::CarbonEstimator;

// ─── Summary types ───────────────────────────────────────────────────────────

/// Unsold units of one product expiring inside the queried window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExpiryGroup {
  pub product_name:    String,
  pub count:           u64,
  /// Location of the representative unit: the one expiring first (lowest
  /// id on ties).
  pub location:        String,
  /// Expiry date of the representative unit.
  pub expiry_date:     NaiveDate,
  /// kg CO2e per unit, when an estimate could be obtained.
  pub carbon_per_unit: Option<f64>,
  /// `carbon_per_unit * count`, or `0.0` without an estimate.
  pub carbon_total:    f64,
}

impl ExpiryGroup {
  /// Whether the carbon sentence should be shown for this group.
  pub fn has_carbon_estimate(&self) -> bool { self.carbon_total > 0.0 }
}

/// Expiring stock grouped by product name, in name order. Always derived
/// fresh from the store.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExpirySummary {
  pub window: Option<ExpiryWindow>,
  pub groups: Vec<ExpiryGroup>,
}

impl ExpirySummary {
  pub fn is_empty(&self) -> bool { self.groups.is_empty() }

  pub fn get(&self, product_name: &str) -> Option<&ExpiryGroup> {
    self.groups.iter().find(|g| g.product_name == product_name)
  }

  /// Total units across every group.
  pub fn total_units(&self) -> u64 { self.groups.iter().map(|g| g.count).sum() }
}

// ─── Grouping ────────────────────────────────────────────────────────────────

/// Per-product count and representative unit, before carbon enrichment.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingGroup<'a> {
  pub product_name:   &'a str,
  pub count:          u64,
  pub representative: &'a StockedItem,
}

/// Group items by product name. The representative of a group is its
/// earliest-expiring unit, with the lowest id breaking ties.
pub fn group_by_product(items: &[StockedItem]) -> Vec<PendingGroup<'_>> {
  let mut groups: BTreeMap<&str, PendingGroup<'_>> = BTreeMap::new();
  for entry in items {
    groups
      .entry(entry.product_name.as_str())
      .and_modify(|g| {
        g.count += 1;
        let rep = &g.representative.item;
        if (entry.item.expiry_date, entry.item.id) < (rep.expiry_date, rep.id) {
          g.representative = entry;
        }
      })
      .or_insert(PendingGroup {
        product_name:   entry.product_name.as_str(),
        count:          1,
        representative: entry,
      });
  }
  groups.into_values().collect()
}

// ─── Aggregator ──────────────────────────────────────────────────────────────

/// Builds [`ExpirySummary`] values from the store, one carbon estimate per
/// product group.
pub struct ExpiryAggregator<S, G> {
  store:     Arc<S>,
  estimator: CarbonEstimator<G>,
}

impl<S, G> Clone for ExpiryAggregator<S, G> {
  fn clone(&self) -> Self {
    Self { store: Arc::clone(&self.store), estimator: self.estimator.clone() }
  }
}

impl<S, G> ExpiryAggregator<S, G>
where
  S: InventoryStore,
  G: TextGenerator,
{
  pub fn new(store: Arc<S>, estimator: CarbonEstimator<G>) -> Self {
    Self { store, estimator }
  }

  pub fn estimator(&self) -> &CarbonEstimator<G> { &self.estimator }

  /// Unsold items expiring in `[today, window_end]`.
  pub async fn aggregate_expiring(
    &self,
    window_end: NaiveDate,
  ) -> Result<ExpirySummary, S::Error> {
    let today = chrono::Local::now().date_naive();
    self.aggregate(ExpiryWindow::new(today, window_end)).await
  }

  /// Unsold items expiring inside `window`.
  ///
  /// Makes one estimator call per distinct product, sequentially, so the
  /// latency grows with the number of groups.
  pub async fn aggregate(&self, window: ExpiryWindow) -> Result<ExpirySummary, S::Error> {
    let items = self.store.list_unsold(Some(window)).await?;

    let mut groups = Vec::new();
    for pending in group_by_product(&items) {
      let carbon_per_unit = self.estimator.estimate(pending.product_name).await;
      let carbon_total = carbon_per_unit.map_or(0.0, |c| c * pending.count as f64);
      let rep = &pending.representative.item;
      groups.push(ExpiryGroup {
        product_name: pending.product_name.to_owned(),
        count: pending.count,
        location: rep.location.clone(),
        expiry_date: rep.expiry_date,
        carbon_per_unit,
        carbon_total,
      });
    }

    tracing::debug!(
      from = %window.from,
      until = %window.until,
      groups = groups.len(),
      "aggregated expiring stock"
    );
    Ok(ExpirySummary { window: Some(window), groups })
  }
}

#[cfg(test)]
mod tests {
  use chrono::Days;
  use larder_core::{
    item::{InventoryItem, StockReceipt},
    product::NewProductType,
    service::ServiceError,
  };
  use larder_store_sqlite::SqliteStore;

  use super::*;
  use crate::fakes::FakeGenerator;

  fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
  }

  fn stocked(id: i64, name: &str, expiry: NaiveDate, location: &str) -> StockedItem {
    StockedItem {
      product_name: name.into(),
      item:         InventoryItem {
        id,
        tag: format!("1-0-{id}"),
        price: 1.0,
        stock_in_date: date(2026, 1, 1),
        expiry_date: expiry,
        location: location.into(),
        product_type_id: 1,
        sold_at: None,
      },
    }
  }

  #[test]
  fn representative_is_earliest_expiry() {
    let items = vec![
      stocked(1, "Milk", date(2026, 1, 9), "Back room"),
      stocked(2, "Milk", date(2026, 1, 7), "Fridge 1"),
      stocked(3, "Bread", date(2026, 1, 8), "Shelf"),
      stocked(4, "Milk", date(2026, 1, 7), "Fridge 2"),
    ];
    let groups = group_by_product(&items);
    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0].product_name, "Bread");
    assert_eq!(groups[1].product_name, "Milk");
    assert_eq!(groups[1].count, 3);
    assert_eq!(groups[1].representative.item.location, "Fridge 1");
  }

  async fn seeded(today: NaiveDate) -> Arc<SqliteStore> {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let milk = store
      .create_product_type(NewProductType::new("Milk", 1.0).unwrap())
      .await
      .unwrap()
      .id;
    let eggs = store
      .create_product_type(NewProductType::new("Eggs", 3.0).unwrap())
      .await
      .unwrap()
      .id;

    for (product, qty, days) in [(milk, 3, 0), (milk, 2, 2), (milk, 4, 3), (eggs, 5, 1)] {
      store
        .receive_stock(
          StockReceipt::new(product, qty, today, today + Days::new(days), "Aisle 1").unwrap(),
        )
        .await
        .unwrap();
    }
    // Sold units never count: sell one of the milk cartons expiring today.
    let tag = store
      .list_unsold(None)
      .await
      .unwrap()
      .into_iter()
      .find(|i| i.product_name == "Milk")
      .unwrap()
      .item
      .tag;
    store.sell(tag).await.unwrap();

    Arc::new(store)
  }

  #[tokio::test]
  async fn counts_match_unsold_items_in_window() {
    let today = date(2026, 5, 1);
    let store = seeded(today).await;
    let generator = Arc::new(FakeGenerator::responding(|prompt| {
      Ok(if prompt.contains("'Milk'") { "1.5".into() } else { "0.25 kg".into() })
    }));
    let aggregator =
      ExpiryAggregator::new(store.clone(), CarbonEstimator::new(generator.clone()));

    let summary = aggregator.aggregate(ExpiryWindow::days_from(today, 2)).await.unwrap();

    // Eggs: 5 units. Milk: 3 + 2 received in-window, one of them sold.
    let eggs = summary.get("Eggs").unwrap();
    assert_eq!(eggs.count, 5);
    assert_eq!(eggs.carbon_total, 1.25);
    let milk = summary.get("Milk").unwrap();
    assert_eq!(milk.count, 4);
    assert_eq!(milk.carbon_per_unit, Some(1.5));
    assert_eq!(milk.carbon_total, 6.0);
    assert_eq!(milk.expiry_date, today);
    assert_eq!(summary.total_units(), 9);

    // One estimate per product group.
    assert_eq!(generator.calls(), 2);
  }

  #[tokio::test]
  async fn missing_estimate_leaves_zero_carbon() {
    let today = date(2026, 5, 1);
    let store = seeded(today).await;
    let aggregator = ExpiryAggregator::new(
      store,
      CarbonEstimator::new(Arc::new(FakeGenerator::failing(
        ServiceError::MissingCredential("Gemini"),
      ))),
    );

    let summary = aggregator.aggregate(ExpiryWindow::on(today)).await.unwrap();
    let milk = summary.get("Milk").unwrap();
    assert_eq!(milk.carbon_per_unit, None);
    assert_eq!(milk.carbon_total, 0.0);
    assert!(!milk.has_carbon_estimate());
  }

  #[tokio::test]
  async fn empty_window_makes_no_estimates() {
    let today = date(2026, 5, 1);
    let store = seeded(today).await;
    let generator = Arc::new(FakeGenerator::replying(std::iter::empty::<&str>()));
    let aggregator = ExpiryAggregator::new(store, CarbonEstimator::new(generator.clone()));

    let far = today + Days::new(30);
    let summary = aggregator.aggregate(ExpiryWindow::on(far)).await.unwrap();
    assert!(summary.is_empty());
    assert_eq!(generator.calls(), 0);
  }
}
