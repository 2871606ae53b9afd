// SPDX-License-Identifier: Apache-2.0

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

use crate::ids::ProductId;

#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QrPayloadError {
    InvalidJson(String),
    MissingProductId,
    InvalidProductId(String),
}

impl Display for QrPayloadError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidJson(msg) => write!(f, "qr payload is not valid json: {msg}"),
            Self::MissingProductId => f.write_str("qr payload has no product_id field"),
            Self::InvalidProductId(msg) => write!(f, "qr payload product_id invalid: {msg}"),
        }
    }
}

impl std::error::Error for QrPayloadError {}

/// The JSON embedded in a printed QR label. The display fields are a
/// snapshot taken at generation time and go stale when the product is
/// edited; only `product_id` may be trusted for lookups.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[non_exhaustive]
pub struct QrPayload {
    pub product_id: ProductId,
    pub name: String,
    pub category: String,
    pub size: String,
    pub color: Option<String>,
    pub generated_at: DateTime<Utc>,
}

impl QrPayload {
    #[must_use]
    pub fn new(
        product_id: ProductId,
        name: String,
        category: String,
        size: String,
        color: Option<String>,
        generated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            product_id,
            name,
            category,
            size,
            color,
            generated_at,
        }
    }

    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Lenient decode for scanner input: any JSON object carrying a
    /// non-empty `product_id` is accepted, so labels printed by older
    /// generators still scan.
    pub fn decode_product_id(raw: &str) -> Result<ProductId, QrPayloadError> {
        let value: serde_json::Value =
            serde_json::from_str(raw).map_err(|e| QrPayloadError::InvalidJson(e.to_string()))?;
        let raw_id = value
            .get("product_id")
            .and_then(serde_json::Value::as_str)
            .ok_or(QrPayloadError::MissingProductId)?;
        ProductId::parse(raw_id).map_err(|e| QrPayloadError::InvalidProductId(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_decode_round_trip() {
        let payload = QrPayload::new(
            ProductId::parse("SHI-M-LX2V9K-A3F7Q").expect("id"),
            "Blue Shirt".to_string(),
            "Shirt".to_string(),
            "M".to_string(),
            Some("Blue".to_string()),
            Utc::now(),
        );
        let encoded = payload.encode().expect("encode");
        let id = QrPayload::decode_product_id(&encoded).expect("decode");
        assert_eq!(id, payload.product_id);
    }

    #[test]
    fn decode_distinguishes_bad_json_from_missing_id() {
        assert!(matches!(
            QrPayload::decode_product_id("not json"),
            Err(QrPayloadError::InvalidJson(_))
        ));
        assert_eq!(
            QrPayload::decode_product_id("{\"name\":\"Blue Shirt\"}"),
            Err(QrPayloadError::MissingProductId)
        );
        assert!(matches!(
            QrPayload::decode_product_id("{\"product_id\":\"\"}"),
            Err(QrPayloadError::InvalidProductId(_))
        ));
    }

    #[test]
    fn decode_accepts_legacy_labels_with_extra_fields() {
        let raw = "{\"product_id\":\"SHI-M-LX2V9K-A3F7Q\",\"type\":\"Shirt\",\"timestamp\":\"05/08/2026\"}";
        let id = QrPayload::decode_product_id(raw).expect("decode");
        assert_eq!(id.as_str(), "SHI-M-LX2V9K-A3F7Q");
    }
}
