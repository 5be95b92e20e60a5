//! [`SqliteStore`]: the SQLite implementation of [`InventoryStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::OptionalExtension as _;

use larder_core::{
  item::{
    ExpiryWindow, InventoryItem, StockReceipt, StockTotals, StockedItem, tag_prefix,
    tag_sequence,
  },
  product::{NewProductType, ProductType},
  store::InventoryStore,
};

use crate::{
  encode::{
    RawStockedItem, STOCKED_ITEM_COLUMNS, encode_date, encode_dt, product_type_from_row,
  },
  schema::SCHEMA,
  Error, Result,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Larder inventory store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted. Every call
/// is executed on the connection's own thread, one at a time, so multi-step
/// closures below observe a consistent database.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

/// Result of the numbered insert performed by [`SqliteStore::receive_stock`].
enum ReceiveOutcome {
  UnknownProduct,
  SequenceExhausted,
  Received(Vec<InventoryItem>),
}

/// Result of the read-check-update performed by [`SqliteStore::sell`].
enum SaleOutcome {
  NotFound,
  AlreadySold,
  Sold(RawStockedItem),
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn query_stocked(
    &self,
    sql: String,
    params: Vec<String>,
  ) -> Result<Vec<StockedItem>> {
    let raws: Vec<RawStockedItem> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(params), RawStockedItem::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawStockedItem::into_stocked).collect()
  }
}

// ─── InventoryStore impl ─────────────────────────────────────────────────────

impl InventoryStore for SqliteStore {
  type Error = Error;

  // ── Product types ─────────────────────────────────────────────────────────

  async fn create_product_type(&self, input: NewProductType) -> Result<ProductType> {
    let name  = input.name().to_owned();
    let price = input.default_price();

    let inserted: Option<i64> = self
      .conn
      .call({
        let name = name.clone();
        move |conn| {
          let taken = conn
            .query_row(
              "SELECT 1 FROM product_types WHERE name = ?1",
              rusqlite::params![name],
              |_| Ok(true),
            )
            .optional()?
            .unwrap_or(false);
          if taken {
            return Ok(None);
          }
          conn.execute(
            "INSERT INTO product_types (name, default_price) VALUES (?1, ?2)",
            rusqlite::params![name, price],
          )?;
          Ok(Some(conn.last_insert_rowid()))
        }
      })
      .await?;

    let id = inserted.ok_or_else(|| larder_core::Error::DuplicateProductType(name.clone()))?;
    Ok(ProductType { id, name, default_price: price })
  }

  async fn list_product_types(&self) -> Result<Vec<ProductType>> {
    let types = self
      .conn
      .call(|conn| {
        let mut stmt = conn
          .prepare("SELECT id, name, default_price FROM product_types ORDER BY id")?;
        let rows = stmt
          .query_map([], product_type_from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(types)
  }

  async fn get_product_type(&self, id: i64) -> Result<Option<ProductType>> {
    let found = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT id, name, default_price FROM product_types WHERE id = ?1",
            rusqlite::params![id],
            product_type_from_row,
          )
          .optional()?)
      })
      .await?;
    Ok(found)
  }

  async fn delete_product_type(&self, id: i64) -> Result<u64> {
    let removed: Option<u64> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let items: i64 = tx.query_row(
          "SELECT COUNT(*) FROM inventory_items WHERE product_type_id = ?1",
          rusqlite::params![id],
          |r| r.get(0),
        )?;
        let deleted = tx.execute(
          "DELETE FROM product_types WHERE id = ?1",
          rusqlite::params![id],
        )?;
        tx.commit()?;
        Ok((deleted > 0).then_some(items as u64))
      })
      .await?;

    let removed = removed.ok_or(larder_core::Error::ProductTypeNotFound(id))?;
    tracing::debug!(product_type_id = id, items = removed, "deleted product type");
    Ok(removed)
  }

  // ── Items ─────────────────────────────────────────────────────────────────

  async fn receive_stock(&self, receipt: StockReceipt) -> Result<Vec<InventoryItem>> {
    let product_type_id = receipt.product_type_id();
    let prefix          = tag_prefix(product_type_id, Utc::now());

    let outcome = self
      .conn
      .call({
        let prefix = prefix.clone();
        move |conn| {
          let tx = conn.transaction()?;

          let price: Option<f64> = tx
            .query_row(
              "SELECT default_price FROM product_types WHERE id = ?1",
              rusqlite::params![product_type_id],
              |r| r.get(0),
            )
            .optional()?;
          let Some(price) = price else {
            return Ok(ReceiveOutcome::UnknownProduct);
          };

          // Continue numbering after any tags already issued with this prefix.
          let last_seq = {
            let mut stmt = tx.prepare("SELECT tag FROM inventory_items WHERE tag LIKE ?1")?;
            let tags = stmt
              .query_map(rusqlite::params![format!("{prefix}%")], |r| r.get::<_, String>(0))?
              .collect::<rusqlite::Result<Vec<_>>>()?;
            tags.iter().filter_map(|t| tag_sequence(t)).max().unwrap_or(0)
          };

          let Some(end) = last_seq.checked_add(receipt.quantity()) else {
            return Ok(ReceiveOutcome::SequenceExhausted);
          };

          let stock_in = encode_date(receipt.stock_in_date());
          let expiry   = encode_date(receipt.expiry_date());
          let mut items = Vec::with_capacity(receipt.quantity() as usize);
          {
            let mut insert = tx.prepare(
              "INSERT INTO inventory_items (
                 tag, price, stock_in_date, expiry_date, location, product_type_id
               ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;
            for seq in last_seq + 1..=end {
              let tag = format!("{prefix}{seq}");
              insert.execute(rusqlite::params![
                tag,
                price,
                stock_in,
                expiry,
                receipt.location(),
                product_type_id,
              ])?;
              items.push(InventoryItem {
                id: tx.last_insert_rowid(),
                tag,
                price,
                stock_in_date: receipt.stock_in_date(),
                expiry_date: receipt.expiry_date(),
                location: receipt.location().to_owned(),
                product_type_id,
                sold_at: None,
              });
            }
          }
          tx.commit()?;
          Ok(ReceiveOutcome::Received(items))
        }
      })
      .await?;

    match outcome {
      ReceiveOutcome::UnknownProduct => {
        Err(larder_core::Error::ProductTypeNotFound(product_type_id).into())
      }
      ReceiveOutcome::SequenceExhausted => {
        tracing::warn!(%prefix, "tag sequence exhausted");
        Err(larder_core::Error::TagSequenceExhausted(prefix).into())
      }
      ReceiveOutcome::Received(items) => {
        tracing::debug!(product_type_id, count = items.len(), "received stock");
        Ok(items)
      }
    }
  }

  async fn sell(&self, tag: String) -> Result<StockedItem> {
    let tag = tag.trim().to_owned();
    if tag.is_empty() {
      return Err(larder_core::Error::EmptyTag.into());
    }
    let sold_at = encode_dt(Utc::now());

    let outcome = self
      .conn
      .call({
        let tag = tag.clone();
        move |conn| {
          let row: Option<(i64, bool)> = conn
            .query_row(
              "SELECT id, is_sold FROM inventory_items WHERE tag = ?1",
              rusqlite::params![tag],
              |r| Ok((r.get(0)?, r.get(1)?)),
            )
            .optional()?;

          let id = match row {
            None             => return Ok(SaleOutcome::NotFound),
            Some((_, true))  => return Ok(SaleOutcome::AlreadySold),
            Some((id, false)) => id,
          };

          conn.execute(
            "UPDATE inventory_items SET is_sold = 1, sold_at = ?1
             WHERE id = ?2 AND is_sold = 0",
            rusqlite::params![sold_at, id],
          )?;

          let raw = conn.query_row(
            &format!(
              "SELECT {STOCKED_ITEM_COLUMNS}
               FROM inventory_items i
               JOIN product_types p ON p.id = i.product_type_id
               WHERE i.id = ?1"
            ),
            rusqlite::params![id],
            RawStockedItem::from_row,
          )?;
          Ok(SaleOutcome::Sold(raw))
        }
      })
      .await?;

    match outcome {
      SaleOutcome::NotFound => Err(larder_core::Error::TagNotFound(tag).into()),
      SaleOutcome::AlreadySold => Err(larder_core::Error::AlreadySold(tag).into()),
      SaleOutcome::Sold(raw) => {
        let sold = raw.into_stocked()?;
        tracing::debug!(tag = %sold.item.tag, product = %sold.product_name, "item sold");
        Ok(sold)
      }
    }
  }

  // ── Reads ─────────────────────────────────────────────────────────────────

  async fn list_inventory(&self) -> Result<Vec<StockedItem>> {
    let sql = format!(
      "SELECT {STOCKED_ITEM_COLUMNS}
       FROM inventory_items i
       JOIN product_types p ON p.id = i.product_type_id
       ORDER BY i.is_sold, p.name, i.expiry_date, i.id"
    );
    self.query_stocked(sql, Vec::new()).await
  }

  async fn list_unsold(&self, window: Option<ExpiryWindow>) -> Result<Vec<StockedItem>> {
    let (filter, params) = match window {
      Some(w) => (
        "AND i.expiry_date >= ?1 AND i.expiry_date <= ?2",
        vec![encode_date(w.from), encode_date(w.until)],
      ),
      None => ("", Vec::new()),
    };
    let sql = format!(
      "SELECT {STOCKED_ITEM_COLUMNS}
       FROM inventory_items i
       JOIN product_types p ON p.id = i.product_type_id
       WHERE i.is_sold = 0 {filter}
       ORDER BY p.name, i.expiry_date, i.id"
    );
    self.query_stocked(sql, params).await
  }

  async fn stock_totals(&self) -> Result<StockTotals> {
    let (count, value): (i64, f64) = self
      .conn
      .call(|conn| {
        Ok(conn.query_row(
          "SELECT COUNT(*), COALESCE(SUM(price), 0.0)
           FROM inventory_items WHERE is_sold = 0",
          [],
          |r| Ok((r.get(0)?, r.get(1)?)),
        )?)
      })
      .await?;

    Ok(StockTotals { total_items: count as u64, total_value: value })
  }
}
