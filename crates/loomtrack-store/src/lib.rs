#![forbid(unsafe_code)]

use rusqlite::Connection;
use std::fmt::{Display, Formatter};
use std::path::Path;
use std::time::Duration;
use tracing::info;

mod ids;
mod ledger;
mod products;
mod schema;

pub use ids::{generate_product_id, generate_sku, generate_transaction_id};
pub use ledger::{
    DashboardStats, InventorySummary, InventorySummaryRow, LedgerEntry, MovementOutcome,
    MovementRequest, TransactionFilter,
};
pub use products::{CreatedProduct, NewProduct, ProductPatch, QrRecord};

pub const CRATE_NAME: &str = "loomtrack-store";

#[derive(Debug)]
pub enum StoreError {
    NotFound {
        product_id: String,
    },
    Inactive {
        product_id: String,
    },
    Duplicate {
        field: &'static str,
        value: String,
    },
    InsufficientStock {
        product_id: String,
        available: i64,
        requested: i64,
    },
    Invalid(String),
    Corrupt(String),
    Sqlite(rusqlite::Error),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound { product_id } => write!(f, "product not found: {product_id}"),
            Self::Inactive { product_id } => write!(f, "product is inactive: {product_id}"),
            Self::Duplicate { field, value } => write!(f, "duplicate {field}: {value}"),
            Self::InsufficientStock {
                product_id,
                available,
                requested,
            } => write!(
                f,
                "insufficient stock for {product_id}: {requested} requested, {available} available"
            ),
            Self::Invalid(msg) => write!(f, "rejected write: {msg}"),
            Self::Corrupt(msg) => write!(f, "stored row failed validation: {msg}"),
            Self::Sqlite(err) => write!(f, "sqlite error: {err}"),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            _ => None,
        }
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

/// Owner of the single writer connection. Callers serialize access from the
/// outside (the server wraps the store in a `tokio::sync::Mutex`); every
/// mutation additionally runs in a `BEGIN IMMEDIATE` transaction so a
/// read-modify-write can never interleave with another writer.
pub struct InventoryStore {
    conn: Connection,
}

impl InventoryStore {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        info!(path = %path.display(), "inventory database open");
        Self::bootstrap(conn)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::bootstrap(Connection::open_in_memory()?)
    }

    fn bootstrap(conn: Connection) -> Result<Self, StoreError> {
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.busy_timeout(Duration::from_secs(5))?;
        let _ = conn.set_prepared_statement_cache_capacity(64);
        schema::init(&conn)?;
        Ok(Self { conn })
    }

    pub(crate) fn connection(&self) -> &Connection {
        &self.conn
    }

    pub(crate) fn connection_mut(&mut self) -> &mut Connection {
        &mut self.conn
    }
}

/// UNIQUE-constraint failures surface as conflicts carrying the offending
/// column. `id_value` is the id being inserted (product or transaction id,
/// depending on the statement); anything non-unique passes through.
pub(crate) fn map_constraint(
    err: rusqlite::Error,
    id_value: &str,
    sku: Option<&str>,
) -> StoreError {
    if let rusqlite::Error::SqliteFailure(code, Some(message)) = &err {
        if code.code == rusqlite::ErrorCode::ConstraintViolation {
            if message.contains("products.sku") {
                return StoreError::Duplicate {
                    field: "sku",
                    value: sku.unwrap_or_default().to_string(),
                };
            }
            if message.contains("products.product_id") || message.contains("qr_codes.product_id") {
                return StoreError::Duplicate {
                    field: "product_id",
                    value: id_value.to_string(),
                };
            }
            if message.contains("transactions.transaction_id") {
                return StoreError::Duplicate {
                    field: "transaction_id",
                    value: id_value.to_string(),
                };
            }
        }
    }
    StoreError::Sqlite(err)
}
