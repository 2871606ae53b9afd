#![forbid(unsafe_code)]
//! Loomtrack model SSOT: products, the append-only stock ledger, and the
//! QR payload that links a physical garment back to its product row.

mod ids;
mod product;
mod qr;
mod transaction;

pub use ids::{ParseError, ProductId, TransactionId, ID_MAX_LEN};
pub use product::{Product, ProductStatus, StockLevel, ATTR_MAX_LEN, NAME_MAX_LEN};
pub use qr::{QrPayload, QrPayloadError};
pub use transaction::{
    Direction, LedgerSummary, StockTransaction, TransactionType, TRANSACTION_TYPES,
};

pub const CRATE_NAME: &str = "loomtrack-model";
