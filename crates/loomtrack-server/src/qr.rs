// SPDX-License-Identifier: Apache-2.0

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use qrcode::render::svg;
use qrcode::{EcLevel, QrCode};
use std::fmt::{Display, Formatter};

use loomtrack_model::QrPayload;

#[derive(Debug)]
#[non_exhaustive]
pub enum QrRenderError {
    Payload(serde_json::Error),
    Encode(String),
}

impl Display for QrRenderError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Payload(err) => write!(f, "qr payload serialization failed: {err}"),
            Self::Encode(msg) => write!(f, "qr encoding failed: {msg}"),
        }
    }
}

impl std::error::Error for QrRenderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Payload(err) => Some(err),
            Self::Encode(_) => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct QrRender {
    pub payload_json: String,
    pub data_url: String,
}

/// Renders the payload at error-correction level H (labels get handled,
/// creased, and rescanned) as an SVG data URL.
pub fn render_product_qr(payload: &QrPayload) -> Result<QrRender, QrRenderError> {
    let payload_json = payload.encode().map_err(QrRenderError::Payload)?;
    let code = QrCode::with_error_correction_level(payload_json.as_bytes(), EcLevel::H)
        .map_err(|e| QrRenderError::Encode(e.to_string()))?;
    let image = code
        .render::<svg::Color>()
        .min_dimensions(300, 300)
        .quiet_zone(true)
        .dark_color(svg::Color("#000000"))
        .light_color(svg::Color("#ffffff"))
        .build();
    let data_url = format!("data:image/svg+xml;base64,{}", STANDARD.encode(image));
    Ok(QrRender {
        payload_json,
        data_url,
    })
}
