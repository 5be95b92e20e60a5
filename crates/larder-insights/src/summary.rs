//! Pure summary computations over the loaded datasets.

use std::collections::HashMap;

use serde::Serialize;

use crate::dataset::{CustomerRecord, ProductRecord, TransactionRecord};

/// Number of entries in the top-seller and slow-mover lists.
pub const LIST_LIMIT: usize = 5;

/// A product with fewer transactions than this is a slow mover.
pub const SLOW_MOVER_THRESHOLD: u64 = 5;

// ─── Sales ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopSeller {
  pub name:     String,
  pub quantity: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlowMover {
  pub name:       String,
  /// Number of transactions that included the product.
  pub units_sold: u64,
}

/// Pair every transaction with its product name, dropping transactions that
/// reference an unknown product.
fn named_sales<'a>(
  products: &'a [ProductRecord],
  transactions: &'a [TransactionRecord],
) -> impl Iterator<Item = (&'a str, &'a TransactionRecord)> {
  let names: HashMap<i64, &str> = products
    .iter()
    .map(|p| (p.product_id, p.product_name.as_str()))
    .collect();
  transactions
    .iter()
    .filter_map(move |t| names.get(&t.product_id).map(|name| (*name, t)))
}

/// Up to [`LIST_LIMIT`] products by total quantity sold, highest first.
/// Ties are broken by name.
pub fn top_sellers(
  products: &[ProductRecord],
  transactions: &[TransactionRecord],
) -> Vec<TopSeller> {
  let mut totals: HashMap<&str, u64> = HashMap::new();
  for (name, t) in named_sales(products, transactions) {
    *totals.entry(name).or_default() += t.quantity;
  }

  let mut ranked: Vec<TopSeller> = totals
    .into_iter()
    .map(|(name, quantity)| TopSeller { name: name.to_owned(), quantity })
    .collect();
  ranked.sort_by(|a, b| b.quantity.cmp(&a.quantity).then_with(|| a.name.cmp(&b.name)));
  ranked.truncate(LIST_LIMIT);
  ranked
}

/// Up to [`LIST_LIMIT`] products with fewer than [`SLOW_MOVER_THRESHOLD`]
/// transactions, in the order they first appear in the transaction log.
pub fn slow_movers(
  products: &[ProductRecord],
  transactions: &[TransactionRecord],
) -> Vec<SlowMover> {
  let mut order: Vec<&str> = Vec::new();
  let mut counts: HashMap<&str, u64> = HashMap::new();
  for (name, _) in named_sales(products, transactions) {
    let count = counts.entry(name).or_default();
    if *count == 0 {
      order.push(name);
    }
    *count += 1;
  }

  order
    .into_iter()
    .map(|name| SlowMover { name: name.to_owned(), units_sold: counts[name] })
    .filter(|m| m.units_sold < SLOW_MOVER_THRESHOLD)
    .take(LIST_LIMIT)
    .collect()
}

// ─── Customers ───────────────────────────────────────────────────────────────

/// Customer age bands. Each band includes its lower bound and excludes its
/// upper bound: `[18, 30)`, `[30, 45)`, `[45, 60)`, `[60, 100)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum AgeBucket {
  #[serde(rename = "18-30")]
  From18To30,
  #[serde(rename = "31-45")]
  From31To45,
  #[serde(rename = "46-60")]
  From46To60,
  #[serde(rename = "60+")]
  Over60,
}

impl AgeBucket {
  pub const ALL: [AgeBucket; 4] =
    [Self::From18To30, Self::From31To45, Self::From46To60, Self::Over60];

  /// The band for `age`, or `None` for ages outside `[18, 100)`.
  pub fn for_age(age: i64) -> Option<Self> {
    match age {
      18..30 => Some(Self::From18To30),
      30..45 => Some(Self::From31To45),
      45..60 => Some(Self::From46To60),
      60..100 => Some(Self::Over60),
      _ => None,
    }
  }

  pub fn label(self) -> &'static str {
    match self {
      Self::From18To30 => "18-30",
      Self::From31To45 => "31-45",
      Self::From46To60 => "46-60",
      Self::Over60 => "60+",
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AgeDistribution {
  /// One entry per [`AgeBucket`], in band order, including empty bands.
  pub buckets:  Vec<(AgeBucket, u64)>,
  /// Customers whose age was missing, unreadable or outside every band.
  pub excluded: u64,
}

impl AgeDistribution {
  pub fn count(&self, bucket: AgeBucket) -> u64 {
    self
      .buckets
      .iter()
      .find(|(b, _)| *b == bucket)
      .map_or(0, |(_, n)| *n)
  }
}

pub fn age_distribution(customers: &[CustomerRecord]) -> AgeDistribution {
  let mut buckets: Vec<(AgeBucket, u64)> =
    AgeBucket::ALL.iter().map(|b| (*b, 0)).collect();
  let mut excluded = 0;

  for c in customers {
    match c.age.and_then(AgeBucket::for_age) {
      Some(bucket) => {
        if let Some(slot) = buckets.iter_mut().find(|(b, _)| *b == bucket) {
          slot.1 += 1;
        }
      }
      None => {
        tracing::debug!(customer_id = c.customer_id, age = ?c.age, "age missing or outside 18..100");
        excluded += 1;
      }
    }
  }

  AgeDistribution { buckets, excluded }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenderCount {
  pub gender: String,
  pub count:  u64,
}

/// Customers per observed gender label, most common first.
pub fn gender_distribution(customers: &[CustomerRecord]) -> Vec<GenderCount> {
  let mut counts: HashMap<&str, u64> = HashMap::new();
  for c in customers {
    *counts.entry(c.gender.as_str()).or_default() += 1;
  }

  let mut out: Vec<GenderCount> = counts
    .into_iter()
    .map(|(gender, count)| GenderCount { gender: gender.to_owned(), count })
    .collect();
  out.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.gender.cmp(&b.gender)));
  out
}

#[cfg(test)]
mod tests {
  use super::*;

  fn product(id: i64, name: &str) -> ProductRecord {
    ProductRecord { product_id: id, product_name: name.into() }
  }

  fn sale(id: i64, product_id: i64, quantity: u64) -> TransactionRecord {
    TransactionRecord { transaction_id: id, customer_id: 1, product_id, quantity }
  }

  fn customer(id: i64, age: i64, gender: &str) -> CustomerRecord {
    CustomerRecord { customer_id: id, age: Some(age), gender: gender.into() }
  }

  #[test]
  fn top_sellers_limited_and_non_increasing() {
    let products: Vec<_> = (1..=8).map(|i| product(i, &format!("P{i}"))).collect();
    let sales: Vec<_> = (1..=8).map(|i| sale(i, i, i as u64 * 3)).collect();

    let top = top_sellers(&products, &sales);
    assert_eq!(top.len(), LIST_LIMIT);
    assert_eq!(top[0].name, "P8");
    assert!(top.windows(2).all(|w| w[0].quantity >= w[1].quantity));
  }

  #[test]
  fn top_sellers_sum_by_name_and_skip_unknown_products() {
    let products = vec![product(1, "Milk"), product(2, "Milk"), product(3, "Eggs")];
    let sales = vec![sale(1, 1, 2), sale(2, 2, 3), sale(3, 3, 4), sale(4, 99, 50)];

    let top = top_sellers(&products, &sales);
    assert_eq!(top, vec![
      TopSeller { name: "Milk".into(), quantity: 5 },
      TopSeller { name: "Eggs".into(), quantity: 4 },
    ]);
  }

  #[test]
  fn slow_movers_follow_first_appearance() {
    let products = vec![product(1, "A"), product(2, "B"), product(3, "C")];
    let mut sales = vec![sale(1, 3, 1), sale(2, 1, 1)];
    // B is a fast mover: five transactions.
    sales.extend((10..15).map(|i| sale(i, 2, 1)));
    sales.push(sale(20, 3, 1));

    let slow = slow_movers(&products, &sales);
    assert_eq!(slow, vec![
      SlowMover { name: "C".into(), units_sold: 2 },
      SlowMover { name: "A".into(), units_sold: 1 },
    ]);
  }

  #[test]
  fn age_band_boundaries() {
    let expect = [
      (18, AgeBucket::From18To30),
      (29, AgeBucket::From18To30),
      (30, AgeBucket::From31To45),
      (45, AgeBucket::From46To60),
      (60, AgeBucket::Over60),
      (99, AgeBucket::Over60),
    ];
    for (age, bucket) in expect {
      assert_eq!(AgeBucket::for_age(age), Some(bucket), "age {age}");
    }
    assert_eq!(AgeBucket::for_age(17), None);
    assert_eq!(AgeBucket::for_age(100), None);
    assert_eq!(AgeBucket::for_age(-1), None);
  }

  #[test]
  fn age_distribution_counts_and_excludes() {
    let customers: Vec<_> = [18, 29, 30, 45, 60, 99, 12, 100]
      .iter()
      .enumerate()
      .map(|(i, age)| customer(i as i64, *age, "Other"))
      .collect();

    let dist = age_distribution(&customers);
    assert_eq!(dist.count(AgeBucket::From18To30), 2);
    assert_eq!(dist.count(AgeBucket::From31To45), 1);
    assert_eq!(dist.count(AgeBucket::From46To60), 1);
    assert_eq!(dist.count(AgeBucket::Over60), 2);
    assert_eq!(dist.excluded, 2);
    assert_eq!(dist.buckets.len(), 4);
  }

  #[test]
  fn gender_distribution_most_common_first() {
    let customers = vec![
      customer(1, 20, "Female"),
      customer(2, 20, "Male"),
      customer(3, 20, "Female"),
    ];
    let dist = gender_distribution(&customers);
    assert_eq!(dist, vec![
      GenderCount { gender: "Female".into(), count: 2 },
      GenderCount { gender: "Male".into(), count: 1 },
    ]);
  }
}
