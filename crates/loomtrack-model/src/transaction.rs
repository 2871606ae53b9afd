// SPDX-License-Identifier: Apache-2.0

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{ParseError, ProductId, TransactionId};

pub const TRANSACTION_TYPES: [&str; 6] = [
    "STOCK_IN",
    "STOCK_OUT",
    "SALE",
    "RETURN",
    "ADJUSTMENT",
    "INITIAL_STOCK",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Inbound,
    Outbound,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[non_exhaustive]
pub enum TransactionType {
    StockIn,
    StockOut,
    Sale,
    Return,
    Adjustment,
    InitialStock,
}

impl TransactionType {
    pub fn parse(raw: &str) -> Result<Self, ParseError> {
        match raw {
            "STOCK_IN" => Ok(Self::StockIn),
            "STOCK_OUT" => Ok(Self::StockOut),
            "SALE" => Ok(Self::Sale),
            "RETURN" => Ok(Self::Return),
            "ADJUSTMENT" => Ok(Self::Adjustment),
            "INITIAL_STOCK" => Ok(Self::InitialStock),
            _ => Err(ParseError::InvalidFormat(
                "transaction_type must be one of STOCK_IN, STOCK_OUT, SALE, RETURN, ADJUSTMENT, INITIAL_STOCK",
            )),
        }
    }

    /// Scan actions accepted on the wire. `IN`/`OUT` are the handheld
    /// scanner shorthand; the long forms and `SALE`/`RETURN` come from the
    /// desktop UI.
    pub fn parse_action(raw: &str) -> Result<Self, ParseError> {
        match raw {
            "IN" | "STOCK_IN" => Ok(Self::StockIn),
            "OUT" | "STOCK_OUT" => Ok(Self::StockOut),
            "SALE" => Ok(Self::Sale),
            "RETURN" => Ok(Self::Return),
            _ => Err(ParseError::InvalidFormat(
                "action must be one of IN, OUT, STOCK_IN, STOCK_OUT, SALE, RETURN",
            )),
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::StockIn => "STOCK_IN",
            Self::StockOut => "STOCK_OUT",
            Self::Sale => "SALE",
            Self::Return => "RETURN",
            Self::Adjustment => "ADJUSTMENT",
            Self::InitialStock => "INITIAL_STOCK",
        }
    }

    /// RETURN puts stock back on the shelf; ADJUSTMENT only ever removes
    /// (it records write-offs and soft-delete zeroing).
    #[must_use]
    pub const fn direction(self) -> Direction {
        match self {
            Self::StockIn | Self::Return | Self::InitialStock => Direction::Inbound,
            Self::StockOut | Self::Sale | Self::Adjustment => Direction::Outbound,
        }
    }
}

/// One immutable ledger row. `previous_stock`/`new_stock` snapshot the
/// product quantity around the movement so audits never need replay.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct StockTransaction {
    pub transaction_id: TransactionId,
    pub product_id: ProductId,
    pub transaction_type: TransactionType,
    pub quantity: i64,
    pub previous_stock: i64,
    pub new_stock: i64,
    pub performed_by: String,
    pub location: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl StockTransaction {
    pub fn validate(&self) -> Result<(), ParseError> {
        if self.quantity < 0 {
            return Err(ParseError::InvalidFormat(
                "transaction quantity must not be negative",
            ));
        }
        if self.previous_stock < 0 || self.new_stock < 0 {
            return Err(ParseError::InvalidFormat(
                "stock snapshots must not be negative",
            ));
        }
        let expected = match self.transaction_type.direction() {
            Direction::Inbound => self.previous_stock + self.quantity,
            Direction::Outbound => self.previous_stock - self.quantity,
        };
        if self.new_stock != expected {
            return Err(ParseError::InvalidFormat(
                "new_stock must equal previous_stock adjusted by quantity",
            ));
        }
        if self.performed_by.is_empty() {
            return Err(ParseError::Empty("performed_by"));
        }
        Ok(())
    }
}

/// Running totals over one product's ledger, computed by aggregation at
/// read time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct LedgerSummary {
    pub total_stock_in: i64,
    pub total_stock_out: i64,
    pub total_sales: i64,
    pub total_returns: i64,
    pub net_stock: i64,
    pub transaction_count: i64,
    pub last_transaction_at: Option<DateTime<Utc>>,
}
