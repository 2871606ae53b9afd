// SPDX-License-Identifier: Apache-2.0

use chrono::{DateTime, Utc};
use rusqlite::{params, params_from_iter, types::Value, Connection, OptionalExtension, Row,
    TransactionBehavior};
use serde::Serialize;

use loomtrack_model::{
    Direction, LedgerSummary, Product, ProductId, StockTransaction, TransactionId,
    TransactionType,
};

use crate::ids::generate_transaction_id;
use crate::products::{row_to_product, PRODUCT_COLUMNS};
use crate::{map_constraint, InventoryStore, StoreError};

pub(crate) const TRANSACTION_COLUMNS: &str = "transaction_id, product_id, transaction_type, \
     quantity, previous_stock, new_stock, performed_by, location, notes, created_at";

#[derive(Debug, Clone)]
pub struct MovementRequest {
    pub product_id: ProductId,
    pub transaction_type: TransactionType,
    pub quantity: i64,
    pub performed_by: String,
    pub location: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone)]
pub struct MovementOutcome {
    pub product: Product,
    pub previous_quantity: i64,
    pub transaction: StockTransaction,
}

/// Ledger row joined with the product's display attributes, the shape the
/// transaction listing endpoints return.
#[derive(Debug, Clone, Serialize)]
pub struct LedgerEntry {
    #[serde(flatten)]
    pub transaction: StockTransaction,
    pub product_name: Option<String>,
    pub category: Option<String>,
    pub size: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    pub product_id: Option<String>,
    pub transaction_type: Option<TransactionType>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub performed_by: Option<String>,
    pub limit: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct InventorySummaryRow {
    pub category: String,
    pub size: String,
    pub total_quantity: i64,
    pub product_count: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct InventorySummary {
    pub rows: Vec<InventorySummaryRow>,
    pub total_items: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardStats {
    pub today_transactions: i64,
    pub total_transactions: i64,
    pub total_stock_in: i64,
    pub total_stock_out: i64,
    pub recent: Vec<LedgerEntry>,
}

fn corrupt(
    idx: usize,
    err: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(err))
}

pub(crate) fn row_to_transaction(row: &Row<'_>) -> rusqlite::Result<StockTransaction> {
    let transaction_id =
        TransactionId::parse(&row.get::<_, String>(0)?).map_err(|e| corrupt(0, e))?;
    let product_id = ProductId::parse(&row.get::<_, String>(1)?).map_err(|e| corrupt(1, e))?;
    let transaction_type =
        TransactionType::parse(&row.get::<_, String>(2)?).map_err(|e| corrupt(2, e))?;
    Ok(StockTransaction {
        transaction_id,
        product_id,
        transaction_type,
        quantity: row.get(3)?,
        previous_stock: row.get(4)?,
        new_stock: row.get(5)?,
        performed_by: row.get(6)?,
        location: row.get(7)?,
        notes: row.get(8)?,
        created_at: row.get(9)?,
    })
}

pub(crate) fn insert_transaction(
    conn: &Connection,
    record: &StockTransaction,
) -> Result<(), StoreError> {
    conn.execute(
        "INSERT INTO transactions (transaction_id, product_id, transaction_type, quantity, \
         previous_stock, new_stock, performed_by, location, notes, created_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            record.transaction_id.as_str(),
            record.product_id.as_str(),
            record.transaction_type.as_str(),
            record.quantity,
            record.previous_stock,
            record.new_stock,
            record.performed_by,
            record.location,
            record.notes,
            record.created_at,
        ],
    )
    .map_err(|e| map_constraint(e, record.transaction_id.as_str(), None))?;
    Ok(())
}

impl InventoryStore {
    /// The scan operation: read the live quantity, apply the signed delta,
    /// and append the ledger row, all inside one immediate transaction.
    /// Either both rows land or neither does.
    pub fn apply_movement(&mut self, req: &MovementRequest) -> Result<MovementOutcome, StoreError> {
        if req.quantity <= 0 {
            return Err(StoreError::Invalid(
                "movement quantity must be a positive integer".to_string(),
            ));
        }
        if matches!(
            req.transaction_type,
            TransactionType::Adjustment | TransactionType::InitialStock
        ) {
            return Err(StoreError::Invalid(
                "movement type must be one of STOCK_IN, STOCK_OUT, SALE, RETURN".to_string(),
            ));
        }
        if req.performed_by.is_empty() {
            return Err(StoreError::Invalid(
                "performed_by must not be empty".to_string(),
            ));
        }

        let now = Utc::now();
        let tx = self
            .connection_mut()
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE product_id = ?1");
        let mut product = tx
            .prepare_cached(&sql)?
            .query_row(params![req.product_id.as_str()], row_to_product)
            .optional()?
            .ok_or_else(|| StoreError::NotFound {
                product_id: req.product_id.as_str().to_string(),
            })?;
        if !product.is_active() {
            return Err(StoreError::Inactive {
                product_id: req.product_id.as_str().to_string(),
            });
        }

        let previous = product.quantity;
        let new_quantity = match req.transaction_type.direction() {
            Direction::Inbound => previous + req.quantity,
            Direction::Outbound => {
                if req.quantity > previous {
                    return Err(StoreError::InsufficientStock {
                        product_id: req.product_id.as_str().to_string(),
                        available: previous,
                        requested: req.quantity,
                    });
                }
                previous - req.quantity
            }
        };

        tx.execute(
            "UPDATE products SET quantity = ?1, updated_at = ?2 WHERE product_id = ?3",
            params![new_quantity, now, req.product_id.as_str()],
        )?;

        let record = StockTransaction {
            transaction_id: TransactionId::parse(&generate_transaction_id())
                .map_err(|e| StoreError::Corrupt(e.to_string()))?,
            product_id: product.product_id.clone(),
            transaction_type: req.transaction_type,
            quantity: req.quantity,
            previous_stock: previous,
            new_stock: new_quantity,
            performed_by: req.performed_by.clone(),
            location: req.location.clone(),
            notes: req.notes.clone(),
            created_at: now,
        };
        record
            .validate()
            .map_err(|e| StoreError::Corrupt(e.to_string()))?;
        insert_transaction(&tx, &record)?;

        tx.commit()?;
        product.quantity = new_quantity;
        product.updated_at = now;
        Ok(MovementOutcome {
            product,
            previous_quantity: previous,
            transaction: record,
        })
    }

    pub fn list_transactions(
        &self,
        filter: &TransactionFilter,
    ) -> Result<Vec<LedgerEntry>, StoreError> {
        let mut sql = format!(
            "SELECT t.transaction_id, t.product_id, t.transaction_type, t.quantity, \
             t.previous_stock, t.new_stock, t.performed_by, t.location, t.notes, t.created_at, \
             p.name, p.category, p.size \
             FROM transactions t LEFT JOIN products p ON p.product_id = t.product_id"
        );
        let mut clauses: Vec<&str> = Vec::new();
        let mut params: Vec<Value> = Vec::new();
        if let Some(product_id) = &filter.product_id {
            clauses.push("t.product_id = ?");
            params.push(Value::Text(product_id.clone()));
        }
        if let Some(transaction_type) = filter.transaction_type {
            clauses.push("t.transaction_type = ?");
            params.push(Value::Text(transaction_type.as_str().to_string()));
        }
        if let Some(start_date) = &filter.start_date {
            clauses.push("t.created_at >= ?");
            params.push(Value::Text(start_date.clone()));
        }
        if let Some(end_date) = &filter.end_date {
            clauses.push("t.created_at <= ?");
            params.push(Value::Text(end_date.clone()));
        }
        if let Some(performed_by) = &filter.performed_by {
            clauses.push("t.performed_by = ?");
            params.push(Value::Text(performed_by.clone()));
        }
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        sql.push_str(" ORDER BY t.created_at DESC, t.id DESC LIMIT ?");
        params.push(Value::Integer(filter.limit as i64));

        let mut stmt = self.connection().prepare_cached(&sql)?;
        let rows = stmt.query_map(params_from_iter(params.iter()), |row| {
            let transaction = row_to_transaction(row)?;
            Ok(LedgerEntry {
                transaction,
                product_name: row.get(10)?,
                category: row.get(11)?,
                size: row.get(12)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    pub fn product_transactions(
        &self,
        product_id: &str,
        limit: Option<usize>,
    ) -> Result<Vec<StockTransaction>, StoreError> {
        let sql = match limit {
            Some(_) => format!(
                "SELECT {TRANSACTION_COLUMNS} FROM transactions WHERE product_id = ?1 \
                 ORDER BY created_at DESC, id DESC LIMIT ?2"
            ),
            None => format!(
                "SELECT {TRANSACTION_COLUMNS} FROM transactions WHERE product_id = ?1 \
                 ORDER BY created_at DESC, id DESC"
            ),
        };
        let mut stmt = self.connection().prepare_cached(&sql)?;
        let rows = match limit {
            Some(n) => stmt.query_map(params![product_id, n as i64], row_to_transaction)?,
            None => stmt.query_map(params![product_id], row_to_transaction)?,
        };
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Aggregated at read time over the ledger; nothing materialized,
    /// nothing to go stale.
    pub fn ledger_summary(&self, product_id: &str) -> Result<LedgerSummary, StoreError> {
        self.get_product(product_id)?;
        let mut stmt = self.connection().prepare_cached(
            "SELECT \
               COALESCE(SUM(CASE WHEN transaction_type IN ('STOCK_IN', 'INITIAL_STOCK') \
                   THEN quantity ELSE 0 END), 0), \
               COALESCE(SUM(CASE WHEN transaction_type IN ('STOCK_OUT', 'SALE', 'ADJUSTMENT') \
                   THEN quantity ELSE 0 END), 0), \
               COALESCE(SUM(CASE WHEN transaction_type = 'SALE' THEN quantity ELSE 0 END), 0), \
               COALESCE(SUM(CASE WHEN transaction_type = 'RETURN' THEN quantity ELSE 0 END), 0), \
               COUNT(*), \
               MAX(created_at) \
             FROM transactions WHERE product_id = ?1",
        )?;
        let summary = stmt.query_row(params![product_id], |row| {
            let total_stock_in: i64 = row.get(0)?;
            let total_stock_out: i64 = row.get(1)?;
            let total_sales: i64 = row.get(2)?;
            let total_returns: i64 = row.get(3)?;
            Ok(LedgerSummary {
                total_stock_in,
                total_stock_out,
                total_sales,
                total_returns,
                net_stock: total_stock_in + total_returns - total_stock_out,
                transaction_count: row.get(4)?,
                last_transaction_at: row.get::<_, Option<DateTime<Utc>>>(5)?,
            })
        })?;
        Ok(summary)
    }

    pub fn inventory_summary(&self) -> Result<InventorySummary, StoreError> {
        let mut stmt = self.connection().prepare_cached(
            "SELECT category, size, SUM(quantity), COUNT(*) FROM products \
             WHERE status = 'active' GROUP BY category, size ORDER BY category, size",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(InventorySummaryRow {
                    category: row.get(0)?,
                    size: row.get(1)?,
                    total_quantity: row.get(2)?,
                    product_count: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        let total_items: i64 = self.connection().query_row(
            "SELECT COALESCE(SUM(quantity), 0) FROM products WHERE status = 'active'",
            [],
            |row| row.get(0),
        )?;
        Ok(InventorySummary {
            rows,
            total_items,
        })
    }

    pub fn dashboard_stats(&self, recent_limit: usize) -> Result<DashboardStats, StoreError> {
        let today_transactions: i64 = self.connection().query_row(
            "SELECT COUNT(*) FROM transactions WHERE date(created_at) = date('now')",
            [],
            |row| row.get(0),
        )?;
        let (total_transactions, total_stock_in, total_stock_out) =
            self.connection().query_row(
                "SELECT COUNT(*), \
                   COALESCE(SUM(CASE WHEN transaction_type IN ('STOCK_IN', 'INITIAL_STOCK') \
                       THEN quantity ELSE 0 END), 0), \
                   COALESCE(SUM(CASE WHEN transaction_type IN ('STOCK_OUT', 'SALE') \
                       THEN quantity ELSE 0 END), 0) \
                 FROM transactions",
                [],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )?;
        let recent = self.list_transactions(&TransactionFilter {
            limit: recent_limit,
            ..TransactionFilter::default()
        })?;
        Ok(DashboardStats {
            today_transactions,
            total_transactions,
            total_stock_in,
            total_stock_out,
            recent,
        })
    }
}
