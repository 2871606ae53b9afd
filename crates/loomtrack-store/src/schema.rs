// SPDX-License-Identifier: Apache-2.0

use rusqlite::Connection;

use crate::StoreError;

/// One consolidated schema. The quantity CHECK backs up the application
/// guard in `apply_movement`; a negative balance can never be committed.
const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS products (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    product_id TEXT UNIQUE NOT NULL,
    name TEXT NOT NULL,
    category TEXT NOT NULL,
    size TEXT NOT NULL,
    color TEXT,
    sku TEXT UNIQUE,
    price REAL,
    material TEXT,
    brand TEXT,
    location TEXT,
    min_stock_level INTEGER NOT NULL DEFAULT 10,
    quantity INTEGER NOT NULL DEFAULT 0 CHECK(quantity >= 0),
    status TEXT NOT NULL DEFAULT 'active' CHECK(status IN ('active', 'inactive')),
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS transactions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    transaction_id TEXT UNIQUE NOT NULL,
    product_id TEXT NOT NULL REFERENCES products(product_id),
    transaction_type TEXT NOT NULL CHECK(
        transaction_type IN (
            'STOCK_IN', 'STOCK_OUT', 'SALE', 'RETURN', 'ADJUSTMENT', 'INITIAL_STOCK'
        )
    ),
    quantity INTEGER NOT NULL CHECK(quantity >= 0),
    previous_stock INTEGER NOT NULL CHECK(previous_stock >= 0),
    new_stock INTEGER NOT NULL CHECK(new_stock >= 0),
    performed_by TEXT NOT NULL,
    location TEXT,
    notes TEXT,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_transactions_product_id ON transactions(product_id);
CREATE INDEX IF NOT EXISTS idx_transactions_type ON transactions(transaction_type);
CREATE INDEX IF NOT EXISTS idx_transactions_created_at ON transactions(created_at);

CREATE TABLE IF NOT EXISTS qr_codes (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    product_id TEXT UNIQUE NOT NULL REFERENCES products(product_id),
    qr_payload TEXT NOT NULL,
    qr_image TEXT NOT NULL,
    created_at TEXT NOT NULL
);
";

pub(crate) fn init(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch(SCHEMA)?;
    Ok(())
}
