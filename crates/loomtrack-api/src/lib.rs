#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

mod dto;
mod error_mapping;

pub use dto::{CreateProductRequest, CreateProductResponse, ScanRequest, UpdateProductRequest};
pub use error_mapping::map_error;

pub const CRATE_NAME: &str = "loomtrack-api";
pub const API_VERSION: &str = "v1";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum ApiErrorCode {
    MissingField,
    InvalidField,
    InvalidRequestBody,
    InvalidQrPayload,
    InvalidAction,
    ProductNotFound,
    ProductInactive,
    InsufficientStock,
    DuplicateProduct,
    StorageFailure,
    NotReady,
    Internal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApiError {
    pub code: ApiErrorCode,
    pub message: String,
    pub details: Value,
}

impl ApiError {
    #[must_use]
    pub fn missing_field(name: &str) -> Self {
        Self {
            code: ApiErrorCode::MissingField,
            message: format!("missing required field: {name}"),
            details: json!({"field": name}),
        }
    }

    #[must_use]
    pub fn invalid_field(name: &str, reason: &str) -> Self {
        Self {
            code: ApiErrorCode::InvalidField,
            message: format!("invalid field: {name}"),
            details: json!({"field": name, "reason": reason}),
        }
    }

    #[must_use]
    pub fn invalid_body(reason: &str) -> Self {
        Self {
            code: ApiErrorCode::InvalidRequestBody,
            message: "request body is not a valid json object".to_string(),
            details: json!({"reason": reason}),
        }
    }

    #[must_use]
    pub fn invalid_qr_payload(reason: &str) -> Self {
        Self {
            code: ApiErrorCode::InvalidQrPayload,
            message: "qr payload could not be decoded".to_string(),
            details: json!({"reason": reason}),
        }
    }

    #[must_use]
    pub fn invalid_action(value: &str) -> Self {
        Self {
            code: ApiErrorCode::InvalidAction,
            message: "action must be one of IN, OUT, STOCK_IN, STOCK_OUT, SALE, RETURN"
                .to_string(),
            details: json!({"action": value}),
        }
    }

    #[must_use]
    pub fn product_not_found(product_id: &str) -> Self {
        Self {
            code: ApiErrorCode::ProductNotFound,
            message: "product not found".to_string(),
            details: json!({"product_id": product_id}),
        }
    }

    #[must_use]
    pub fn product_inactive(product_id: &str) -> Self {
        Self {
            code: ApiErrorCode::ProductInactive,
            message: "product has been retired".to_string(),
            details: json!({"product_id": product_id}),
        }
    }

    /// Carries both sides of the rejection so clients can show the shortfall
    /// without a second round trip.
    #[must_use]
    pub fn insufficient_stock(product_id: &str, available: i64, requested: i64) -> Self {
        Self {
            code: ApiErrorCode::InsufficientStock,
            message: "insufficient stock".to_string(),
            details: json!({
                "product_id": product_id,
                "current_quantity": available,
                "requested": requested
            }),
        }
    }

    #[must_use]
    pub fn duplicate(field: &str, value: &str) -> Self {
        Self {
            code: ApiErrorCode::DuplicateProduct,
            message: format!("duplicate {field}"),
            details: json!({"field": field, "value": value}),
        }
    }

    #[must_use]
    pub fn storage(message: &str) -> Self {
        Self {
            code: ApiErrorCode::StorageFailure,
            message: "storage operation failed".to_string(),
            details: json!({"message": message}),
        }
    }

    #[must_use]
    pub fn draining() -> Self {
        Self {
            code: ApiErrorCode::NotReady,
            message: "server draining; refusing new requests".to_string(),
            details: json!({}),
        }
    }
}

pub mod params {
    use super::ApiError;
    use loomtrack_model::TransactionType;
    use std::collections::BTreeMap;

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct TransactionQueryParams {
        pub product_id: Option<String>,
        pub transaction_type: Option<TransactionType>,
        pub start_date: Option<String>,
        pub end_date: Option<String>,
        pub performed_by: Option<String>,
        pub limit: usize,
    }

    pub fn parse_transaction_params(
        query: &BTreeMap<String, String>,
        default_limit: usize,
        max_limit: usize,
    ) -> Result<TransactionQueryParams, ApiError> {
        let transaction_type = match query.get("transaction_type") {
            Some(raw) => Some(
                TransactionType::parse(raw)
                    .map_err(|e| ApiError::invalid_field("transaction_type", &e.to_string()))?,
            ),
            None => None,
        };
        let limit = if let Some(raw) = query.get("limit") {
            let value = raw
                .parse::<usize>()
                .map_err(|_| ApiError::invalid_field("limit", "must be a positive integer"))?;
            if value == 0 || value > max_limit {
                return Err(ApiError::invalid_field("limit", "out of range"));
            }
            value
        } else {
            default_limit
        };
        Ok(TransactionQueryParams {
            product_id: query.get("product_id").cloned(),
            transaction_type,
            start_date: query.get("start_date").cloned(),
            end_date: query.get("end_date").cloned(),
            performed_by: query.get("performed_by").cloned(),
            limit,
        })
    }

    #[must_use]
    pub fn bool_flag(query: &BTreeMap<String, String>, name: &str) -> bool {
        query
            .get(name)
            .is_some_and(|v| v == "1" || v.eq_ignore_ascii_case("true"))
    }
}

#[cfg(test)]
mod tests {
    use super::params::{bool_flag, parse_transaction_params};
    use super::{ApiError, ApiErrorCode};
    use loomtrack_model::TransactionType;
    use std::collections::BTreeMap;

    #[test]
    fn parse_transaction_params_defaults() {
        let q = BTreeMap::new();
        let parsed = parse_transaction_params(&q, 50, 500).expect("params parse");
        assert_eq!(parsed.limit, 50);
        assert!(parsed.product_id.is_none());
        assert!(parsed.transaction_type.is_none());
    }

    #[test]
    fn parse_transaction_params_typed_filter() {
        let mut q = BTreeMap::new();
        q.insert("transaction_type".to_string(), "STOCK_OUT".to_string());
        q.insert("limit".to_string(), "10".to_string());
        let parsed = parse_transaction_params(&q, 50, 500).expect("params parse");
        assert_eq!(parsed.transaction_type, Some(TransactionType::StockOut));
        assert_eq!(parsed.limit, 10);
    }

    #[test]
    fn parse_transaction_params_rejects_bad_limit_and_type() {
        let mut q = BTreeMap::new();
        q.insert("limit".to_string(), "nope".to_string());
        let err = parse_transaction_params(&q, 50, 500).expect_err("bad limit");
        assert_eq!(err.code, ApiErrorCode::InvalidField);

        let mut q = BTreeMap::new();
        q.insert("limit".to_string(), "9999".to_string());
        assert!(parse_transaction_params(&q, 50, 500).is_err());

        let mut q = BTreeMap::new();
        q.insert("transaction_type".to_string(), "GIFT".to_string());
        assert!(parse_transaction_params(&q, 50, 500).is_err());
    }

    #[test]
    fn bool_flag_accepts_one_and_true() {
        let mut q = BTreeMap::new();
        q.insert("include_inactive".to_string(), "1".to_string());
        assert!(bool_flag(&q, "include_inactive"));
        q.insert("include_inactive".to_string(), "TRUE".to_string());
        assert!(bool_flag(&q, "include_inactive"));
        q.insert("include_inactive".to_string(), "no".to_string());
        assert!(!bool_flag(&q, "include_inactive"));
    }

    #[test]
    fn insufficient_stock_details_schema_stable() {
        let e = ApiError::insufficient_stock("SHI-M-X-Y", 7, 20);
        assert_eq!(e.details.get("current_quantity").and_then(|v| v.as_i64()), Some(7));
        assert_eq!(e.details.get("requested").and_then(|v| v.as_i64()), Some(20));
    }
}
