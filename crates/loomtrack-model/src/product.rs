// SPDX-License-Identifier: Apache-2.0

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{ParseError, ProductId};

pub const NAME_MAX_LEN: usize = 256;
pub const ATTR_MAX_LEN: usize = 128;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
#[non_exhaustive]
pub enum ProductStatus {
    Active,
    Inactive,
}

impl ProductStatus {
    pub fn parse(raw: &str) -> Result<Self, ParseError> {
        match raw {
            "active" => Ok(Self::Active),
            "inactive" => Ok(Self::Inactive),
            _ => Err(ParseError::InvalidFormat(
                "product status must be 'active' or 'inactive'",
            )),
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
        }
    }
}

/// Derived from quantity against the per-product low-stock threshold; never
/// stored, so it cannot go stale.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[non_exhaustive]
pub enum StockLevel {
    #[serde(rename = "in-stock")]
    InStock,
    #[serde(rename = "low-stock")]
    LowStock,
    #[serde(rename = "out-of-stock")]
    OutOfStock,
}

impl StockLevel {
    #[must_use]
    pub const fn for_quantity(quantity: i64, min_stock_level: i64) -> Self {
        if quantity <= 0 {
            Self::OutOfStock
        } else if quantity < min_stock_level {
            Self::LowStock
        } else {
            Self::InStock
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InStock => "in-stock",
            Self::LowStock => "low-stock",
            Self::OutOfStock => "out-of-stock",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Product {
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
    pub quantity: i64,
    pub status: ProductStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    #[must_use]
    pub const fn stock_level(&self) -> StockLevel {
        StockLevel::for_quantity(self.quantity, self.min_stock_level)
    }

    #[must_use]
    pub const fn is_active(&self) -> bool {
        matches!(self.status, ProductStatus::Active)
    }

    pub fn validate(&self) -> Result<(), ParseError> {
        validate_attr("name", &self.name, NAME_MAX_LEN)?;
        validate_attr("category", &self.category, ATTR_MAX_LEN)?;
        validate_attr("size", &self.size, ATTR_MAX_LEN)?;
        if self.quantity < 0 {
            return Err(ParseError::InvalidFormat("quantity must not be negative"));
        }
        if self.min_stock_level < 0 {
            return Err(ParseError::InvalidFormat(
                "min_stock_level must not be negative",
            ));
        }
        Ok(())
    }
}

pub(crate) fn validate_attr(
    name: &'static str,
    value: &str,
    max: usize,
) -> Result<(), ParseError> {
    if value.is_empty() {
        return Err(ParseError::Empty(name));
    }
    if value.trim() != value {
        return Err(ParseError::Trimmed(name));
    }
    if value.len() > max {
        return Err(ParseError::TooLong(name, max));
    }
    Ok(())
}
