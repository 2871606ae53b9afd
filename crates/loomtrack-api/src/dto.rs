// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};

use crate::ApiError;

fn default_scan_quantity() -> i64 {
    1
}

fn default_performed_by() -> String {
    "Unknown".to_string()
}

/// `type` is the legacy wire name for the category field.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateProductRequest {
    pub name: String,
    #[serde(alias = "type")]
    pub category: String,
    pub size: String,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub initial_quantity: i64,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub material: Option<String>,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub min_stock_level: Option<i64>,
}

impl CreateProductRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        for (field, value) in [
            ("name", &self.name),
            ("type", &self.category),
            ("size", &self.size),
        ] {
            if value.trim().is_empty() {
                return Err(ApiError::missing_field(field));
            }
        }
        // The size is embedded verbatim in the generated product id; keep it
        // short enough that the id stays within its length cap.
        if self.size.len() > 32 {
            return Err(ApiError::invalid_field("size", "must be 32 characters or fewer"));
        }
        if self.initial_quantity < 0 {
            return Err(ApiError::invalid_field(
                "initial_quantity",
                "must not be negative",
            ));
        }
        if self.min_stock_level.is_some_and(|v| v < 0) {
            return Err(ApiError::invalid_field(
                "min_stock_level",
                "must not be negative",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateProductResponse {
    pub success: bool,
    pub product_id: String,
    pub qr_code: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScanRequest {
    pub qr_data: String,
    pub action: String,
    #[serde(default = "default_scan_quantity")]
    pub quantity: i64,
    #[serde(default = "default_performed_by")]
    pub performed_by: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl ScanRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.qr_data.trim().is_empty() {
            return Err(ApiError::missing_field("qr_data"));
        }
        if self.action.trim().is_empty() {
            return Err(ApiError::missing_field("action"));
        }
        if self.quantity <= 0 {
            return Err(ApiError::invalid_field(
                "quantity",
                "must be a positive integer",
            ));
        }
        if self.performed_by.trim().is_empty() {
            return Err(ApiError::invalid_field("performed_by", "must not be blank"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateProductRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, alias = "type")]
    pub category: Option<String>,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub material: Option<String>,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub min_stock_level: Option<i64>,
}

impl UpdateProductRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        for (field, value) in [
            ("name", &self.name),
            ("type", &self.category),
            ("size", &self.size),
        ] {
            if value.as_deref().is_some_and(|v| v.trim().is_empty()) {
                return Err(ApiError::invalid_field(field, "must not be blank"));
            }
        }
        if self.min_stock_level.is_some_and(|v| v < 0) {
            return Err(ApiError::invalid_field(
                "min_stock_level",
                "must not be negative",
            ));
        }
        Ok(())
    }

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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ApiErrorCode;

    #[test]
    fn create_request_accepts_legacy_type_field() {
        let req: CreateProductRequest = serde_json::from_str(
            "{\"name\":\"Blue Shirt\",\"type\":\"Shirt\",\"size\":\"M\",\"color\":\"Blue\",\
             \"initial_quantity\":10}",
        )
        .expect("deserialize");
        assert_eq!(req.category, "Shirt");
        assert_eq!(req.initial_quantity, 10);
        req.validate().expect("valid");
    }

    #[test]
    fn create_request_missing_size_is_a_missing_field() {
        let req: CreateProductRequest =
            serde_json::from_str("{\"name\":\"X\",\"type\":\"Shirt\",\"size\":\" \"}")
                .expect("deserialize");
        let err = req.validate().expect_err("blank size");
        assert_eq!(err.code, ApiErrorCode::MissingField);
    }

    #[test]
    fn scan_request_defaults() {
        let req: ScanRequest =
            serde_json::from_str("{\"qr_data\":\"{}\",\"action\":\"IN\"}").expect("deserialize");
        assert_eq!(req.quantity, 1);
        assert_eq!(req.performed_by, "Unknown");
        req.validate().expect("valid");
    }

    #[test]
    fn scan_request_rejects_zero_quantity() {
        let req: ScanRequest =
            serde_json::from_str("{\"qr_data\":\"{}\",\"action\":\"OUT\",\"quantity\":0}")
                .expect("deserialize");
        let err = req.validate().expect_err("zero quantity");
        assert_eq!(err.code, ApiErrorCode::InvalidField);
    }

    #[test]
    fn update_request_rejects_blanking_required_attrs() {
        let req: UpdateProductRequest =
            serde_json::from_str("{\"name\":\"\"}").expect("deserialize");
        assert!(req.validate().is_err());
        assert!(!req.is_empty());
        assert!(UpdateProductRequest::default().is_empty());
    }
}
