// SPDX-License-Identifier: Apache-2.0

use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row, TransactionBehavior};

use loomtrack_model::{
    Product, ProductId, ProductStatus, StockTransaction, TransactionId, TransactionType,
};

use crate::ids::generate_transaction_id;
use crate::{map_constraint, InventoryStore, StoreError};

pub const SYSTEM_ACTOR: &str = "System";

pub(crate) const PRODUCT_COLUMNS: &str = "product_id, name, category, size, color, sku, price, \
     material, brand, location, min_stock_level, quantity, status, created_at, updated_at";

#[derive(Debug, Clone)]
pub struct NewProduct {
    pub product_id: ProductId,
    pub name: String,
    pub category: String,
    pub size: String,
    pub color: Option<String>,
    pub sku: Option<String>,
    pub price: Option<f64>,
    pub material: Option<String>,
    pub brand: Option<String>,
    pub location: Option<String>,
    pub min_stock_level: i64,
    pub initial_quantity: i64,
    pub qr_payload: String,
    pub qr_image: String,
}

#[derive(Debug, Clone)]
pub struct CreatedProduct {
    pub product: Product,
    pub initial_transaction: Option<StockTransaction>,
}

#[derive(Debug, Clone)]
pub struct QrRecord {
    pub product_id: ProductId,
    pub qr_payload: String,
    pub qr_image: String,
    pub created_at: DateTime<Utc>,
}

/// Attribute edits; `quantity` is deliberately absent, only the movement
/// operation may touch it.
#[derive(Debug, Clone, Default)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub category: Option<String>,
    pub size: Option<String>,
    pub color: Option<String>,
    pub sku: Option<String>,
    pub price: Option<f64>,
    pub material: Option<String>,
    pub brand: Option<String>,
    pub location: Option<String>,
    pub min_stock_level: Option<i64>,
}

impl ProductPatch {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.category.is_none()
            && self.size.is_none()
            && self.color.is_none()
            && self.sku.is_none()
            && self.price.is_none()
            && self.material.is_none()
            && self.brand.is_none()
            && self.location.is_none()
            && self.min_stock_level.is_none()
    }
}

fn corrupt(
    idx: usize,
    err: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(err))
}

pub(crate) fn row_to_product(row: &Row<'_>) -> rusqlite::Result<Product> {
    let product_id = ProductId::parse(&row.get::<_, String>(0)?).map_err(|e| corrupt(0, e))?;
    let status =
        ProductStatus::parse(&row.get::<_, String>(12)?).map_err(|e| corrupt(12, e))?;
    Ok(Product {
        product_id,
        name: row.get(1)?,
        category: row.get(2)?,
        size: row.get(3)?,
        color: row.get(4)?,
        sku: row.get(5)?,
        price: row.get(6)?,
        material: row.get(7)?,
        brand: row.get(8)?,
        location: row.get(9)?,
        min_stock_level: row.get(10)?,
        quantity: row.get(11)?,
        status,
        created_at: row.get(13)?,
        updated_at: row.get(14)?,
    })
}

impl InventoryStore {
    /// Inserts the product row, its QR record, and (for a non-zero opening
    /// balance) the INITIAL_STOCK ledger row in one transaction.
    pub fn create_product(&mut self, new: NewProduct) -> Result<CreatedProduct, StoreError> {
        let now = Utc::now();
        let product = Product {
            product_id: new.product_id,
            name: new.name,
            category: new.category,
            size: new.size,
            color: new.color,
            sku: new.sku,
            price: new.price,
            material: new.material,
            brand: new.brand,
            location: new.location,
            min_stock_level: new.min_stock_level,
            quantity: new.initial_quantity,
            status: ProductStatus::Active,
            created_at: now,
            updated_at: now,
        };
        product
            .validate()
            .map_err(|e| StoreError::Invalid(e.to_string()))?;

        let tx = self
            .connection_mut()
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        tx.execute(
            "INSERT INTO products (product_id, name, category, size, color, sku, price, \
             material, brand, location, min_stock_level, quantity, status, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
            params![
                product.product_id.as_str(),
                product.name,
                product.category,
                product.size,
                product.color,
                product.sku,
                product.price,
                product.material,
                product.brand,
                product.location,
                product.min_stock_level,
                product.quantity,
                product.status.as_str(),
                product.created_at,
                product.updated_at,
            ],
        )
        .map_err(|e| map_constraint(e, product.product_id.as_str(), product.sku.as_deref()))?;

        tx.execute(
            "INSERT INTO qr_codes (product_id, qr_payload, qr_image, created_at) \
             VALUES (?1, ?2, ?3, ?4)",
            params![product.product_id.as_str(), new.qr_payload, new.qr_image, now],
        )
        .map_err(|e| map_constraint(e, product.product_id.as_str(), None))?;

        let initial_transaction = if new.initial_quantity > 0 {
            let record = StockTransaction {
                transaction_id: TransactionId::parse(&generate_transaction_id())
                    .map_err(|e| StoreError::Corrupt(e.to_string()))?,
                product_id: product.product_id.clone(),
                transaction_type: TransactionType::InitialStock,
                quantity: new.initial_quantity,
                previous_stock: 0,
                new_stock: new.initial_quantity,
                performed_by: SYSTEM_ACTOR.to_string(),
                location: Some("Manufacturing".to_string()),
                notes: Some("Initial stock creation".to_string()),
                created_at: now,
            };
            record
                .validate()
                .map_err(|e| StoreError::Corrupt(e.to_string()))?;
            crate::ledger::insert_transaction(&tx, &record)?;
            Some(record)
        } else {
            None
        };

        tx.commit()?;
        Ok(CreatedProduct {
            product,
            initial_transaction,
        })
    }

    /// Fetches regardless of status so retired products stay auditable.
    pub fn get_product(&self, product_id: &str) -> Result<Product, StoreError> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE product_id = ?1");
        let mut stmt = self.connection().prepare_cached(&sql)?;
        stmt.query_row(params![product_id], row_to_product)
            .optional()?
            .ok_or_else(|| StoreError::NotFound {
                product_id: product_id.to_string(),
            })
    }

    pub fn list_products(&self, include_inactive: bool) -> Result<Vec<Product>, StoreError> {
        let sql = if include_inactive {
            format!("SELECT {PRODUCT_COLUMNS} FROM products ORDER BY created_at DESC, id DESC")
        } else {
            format!(
                "SELECT {PRODUCT_COLUMNS} FROM products WHERE status = 'active' \
                 ORDER BY created_at DESC, id DESC"
            )
        };
        let mut stmt = self.connection().prepare_cached(&sql)?;
        let rows = stmt.query_map([], row_to_product)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    pub fn update_product(
        &mut self,
        product_id: &str,
        patch: &ProductPatch,
    ) -> Result<Product, StoreError> {
        let mut product = self.get_product(product_id)?;
        if !product.is_active() {
            return Err(StoreError::Inactive {
                product_id: product_id.to_string(),
            });
        }
        if let Some(name) = &patch.name {
            product.name = name.clone();
        }
        if let Some(category) = &patch.category {
            product.category = category.clone();
        }
        if let Some(size) = &patch.size {
            product.size = size.clone();
        }
        if let Some(color) = &patch.color {
            product.color = Some(color.clone());
        }
        if let Some(sku) = &patch.sku {
            product.sku = Some(sku.clone());
        }
        if let Some(price) = patch.price {
            product.price = Some(price);
        }
        if let Some(material) = &patch.material {
            product.material = Some(material.clone());
        }
        if let Some(brand) = &patch.brand {
            product.brand = Some(brand.clone());
        }
        if let Some(location) = &patch.location {
            product.location = Some(location.clone());
        }
        if let Some(min_stock_level) = patch.min_stock_level {
            product.min_stock_level = min_stock_level;
        }
        product.updated_at = Utc::now();
        product
            .validate()
            .map_err(|e| StoreError::Invalid(e.to_string()))?;

        let changed = self
            .connection()
            .execute(
                "UPDATE products SET name = ?1, category = ?2, size = ?3, color = ?4, sku = ?5, \
                 price = ?6, material = ?7, brand = ?8, location = ?9, min_stock_level = ?10, \
                 updated_at = ?11 WHERE product_id = ?12 AND status = 'active'",
                params![
                    product.name,
                    product.category,
                    product.size,
                    product.color,
                    product.sku,
                    product.price,
                    product.material,
                    product.brand,
                    product.location,
                    product.min_stock_level,
                    product.updated_at,
                    product_id,
                ],
            )
            .map_err(|e| map_constraint(e, product_id, product.sku.as_deref()))?;
        if changed == 0 {
            return Err(StoreError::NotFound {
                product_id: product_id.to_string(),
            });
        }
        Ok(product)
    }

    /// Soft delete: flips status, writes the remaining stock off with one
    /// ADJUSTMENT row, and leaves all history in place.
    pub fn soft_delete_product(
        &mut self,
        product_id: &str,
        performed_by: &str,
    ) -> Result<(Product, StockTransaction), StoreError> {
        let now = Utc::now();
        let tx = self
            .connection_mut()
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE product_id = ?1");
        let mut product = tx
            .prepare_cached(&sql)?
            .query_row(params![product_id], row_to_product)
            .optional()?
            .ok_or_else(|| StoreError::NotFound {
                product_id: product_id.to_string(),
            })?;
        if !product.is_active() {
            return Err(StoreError::Inactive {
                product_id: product_id.to_string(),
            });
        }

        let written_off = product.quantity;
        tx.execute(
            "UPDATE products SET status = 'inactive', quantity = 0, updated_at = ?1 \
             WHERE product_id = ?2",
            params![now, product_id],
        )?;

        let record = StockTransaction {
            transaction_id: TransactionId::parse(&generate_transaction_id())
                .map_err(|e| StoreError::Corrupt(e.to_string()))?,
            product_id: product.product_id.clone(),
            transaction_type: TransactionType::Adjustment,
            quantity: written_off,
            previous_stock: written_off,
            new_stock: 0,
            performed_by: performed_by.to_string(),
            location: None,
            notes: Some("Product retired".to_string()),
            created_at: now,
        };
        record
            .validate()
            .map_err(|e| StoreError::Corrupt(e.to_string()))?;
        crate::ledger::insert_transaction(&tx, &record)?;

        tx.commit()?;
        product.status = ProductStatus::Inactive;
        product.quantity = 0;
        product.updated_at = now;
        Ok((product, record))
    }

    pub fn get_qr(&self, product_id: &str) -> Result<QrRecord, StoreError> {
        let mut stmt = self.connection().prepare_cached(
            "SELECT product_id, qr_payload, qr_image, created_at FROM qr_codes \
             WHERE product_id = ?1",
        )?;
        stmt.query_row(params![product_id], |row| {
            let id = ProductId::parse(&row.get::<_, String>(0)?).map_err(|e| corrupt(0, e))?;
            Ok(QrRecord {
                product_id: id,
                qr_payload: row.get(1)?,
                qr_image: row.get(2)?,
                created_at: row.get(3)?,
            })
        })
        .optional()?
        .ok_or_else(|| StoreError::NotFound {
            product_id: product_id.to_string(),
        })
    }
}
