#![forbid(unsafe_code)]

use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::Router;
use loomtrack_store::InventoryStore;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

mod config;
mod http;
mod qr;
mod telemetry;

pub use config::{validate_startup_config_contract, ApiConfig, CONFIG_SCHEMA_VERSION};
pub use qr::{render_product_qr, QrRender, QrRenderError};

pub const CRATE_NAME: &str = "loomtrack-server";
pub const SERVICE_NAME: &str = "Loomtrack Inventory API";

#[derive(Default)]
pub(crate) struct RequestMetrics {
    counts: Mutex<HashMap<(String, u16), u64>>,
    latency_ns: Mutex<HashMap<String, Vec<u64>>>,
}

impl RequestMetrics {
    pub(crate) async fn observe_request(&self, route: &str, status: StatusCode, latency: Duration) {
        let mut counts = self.counts.lock().await;
        *counts
            .entry((route.to_string(), status.as_u16()))
            .or_insert(0) += 1;
        drop(counts);
        let mut latency_map = self.latency_ns.lock().await;
        latency_map
            .entry(route.to_string())
            .or_insert_with(Vec::new)
            .push(latency.as_nanos() as u64);
    }

    pub(crate) async fn counts_snapshot(&self) -> Vec<((String, u16), u64)> {
        let counts = self.counts.lock().await;
        let mut out: Vec<_> = counts.iter().map(|(k, v)| (k.clone(), *v)).collect();
        out.sort();
        out
    }

    pub(crate) async fn latency_snapshot(&self) -> Vec<(String, Vec<u64>)> {
        let latency = self.latency_ns.lock().await;
        let mut out: Vec<_> = latency.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
        out.sort_by(|a, b| a.0.cmp(&b.0));
        out
    }
}

/// Shared handler state. The store sits behind one async mutex: SQLite has a
/// single writer anyway, and holding the lock across a whole
/// read-modify-write is what makes concurrent scans of the same product
/// safe.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<Mutex<InventoryStore>>,
    pub api: ApiConfig,
    pub accepting_requests: Arc<AtomicBool>,
    pub(crate) metrics: Arc<RequestMetrics>,
    pub(crate) request_id_seed: Arc<AtomicU64>,
}

impl AppState {
    #[must_use]
    pub fn new(store: InventoryStore) -> Self {
        Self::with_config(store, ApiConfig::default())
    }

    #[must_use]
    pub fn with_config(store: InventoryStore, api: ApiConfig) -> Self {
        Self {
            store: Arc::new(Mutex::new(store)),
            api,
            accepting_requests: Arc::new(AtomicBool::new(true)),
            metrics: Arc::new(RequestMetrics::default()),
            request_id_seed: Arc::new(AtomicU64::new(1)),
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(http::handlers::health_handler))
        .route("/api/health", get(http::handlers::api_health_handler))
        .route("/metrics", get(http::handlers::metrics_handler))
        .route(
            "/api/products/create",
            post(http::handlers::create_product_handler),
        )
        .route("/api/products", get(http::handlers::list_products_handler))
        .route(
            "/api/products/{product_id}",
            get(http::handlers::get_product_handler)
                .put(http::handlers::update_product_handler)
                .delete(http::handlers::delete_product_handler),
        )
        .route(
            "/api/products/{product_id}/transactions",
            get(http::handlers::product_transactions_handler),
        )
        .route(
            "/api/products/{product_id}/summary",
            get(http::handlers::product_summary_handler),
        )
        .route("/api/qr/{product_id}", get(http::handlers::qr_handler))
        .route("/api/inventory/scan", post(http::handlers::scan_handler))
        .route(
            "/api/inventory/summary",
            get(http::handlers::inventory_summary_handler),
        )
        .route(
            "/api/transactions",
            get(http::handlers::list_transactions_handler),
        )
        .route(
            "/api/dashboard/stats",
            get(http::handlers::dashboard_stats_handler),
        )
        .layer(DefaultBodyLimit::max(state.api.max_body_bytes))
        .with_state(state)
}
