//! SQL schema for the Larder SQLite store.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS product_types (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    name          TEXT    NOT NULL UNIQUE,
    default_price REAL    NOT NULL
);

-- One row per physical unit. Rows are only ever updated once (unsold -> sold)
-- and only deleted through the cascade from product_types.
CREATE TABLE IF NOT EXISTS inventory_items (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    tag             TEXT    NOT NULL UNIQUE,
    price           REAL    NOT NULL,
    stock_in_date   TEXT    NOT NULL,   -- YYYY-MM-DD
    expiry_date     TEXT    NOT NULL,   -- YYYY-MM-DD
    location        TEXT    NOT NULL,
    is_sold         INTEGER NOT NULL DEFAULT 0,
    sold_at         TEXT,               -- RFC 3339 UTC; NULL while in stock
    product_type_id INTEGER NOT NULL
                    REFERENCES product_types(id) ON DELETE CASCADE,
    CHECK ((is_sold = 0 AND sold_at IS NULL) OR (is_sold = 1 AND sold_at IS NOT NULL))
);

CREATE INDEX IF NOT EXISTS items_product_idx ON inventory_items(product_type_id);
CREATE INDEX IF NOT EXISTS items_expiry_idx  ON inventory_items(is_sold, expiry_date);

PRAGMA user_version = 1;
";
