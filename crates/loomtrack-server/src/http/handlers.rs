// SPDX-License-Identifier: Apache-2.0

use axum::extract::{Path as AxumPath, Query, State};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::atomic::Ordering;
use std::time::Instant;
use tracing::{info, warn};

use loomtrack_api::params::{bool_flag, parse_transaction_params};
use loomtrack_api::{
    map_error, ApiError, CreateProductRequest, CreateProductResponse, ScanRequest,
    UpdateProductRequest,
};
use loomtrack_model::{Product, ProductId, QrPayload, TransactionType};
use loomtrack_store::{
    generate_product_id, generate_sku, MovementRequest, NewProduct, ProductPatch, StoreError,
    TransactionFilter,
};

use crate::qr::render_product_qr;
use crate::{AppState, CONFIG_SCHEMA_VERSION, SERVICE_NAME};

pub(crate) fn make_request_id(state: &AppState) -> String {
    let id = state.request_id_seed.fetch_add(1, Ordering::Relaxed);
    format!("req-{id:016x}")
}

pub(crate) fn propagated_request_id(headers: &HeaderMap, state: &AppState) -> String {
    if let Some(raw) = headers.get("x-request-id").and_then(|v| v.to_str().ok()) {
        let trimmed = raw.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }
    make_request_id(state)
}

pub(crate) fn with_request_id(mut response: Response, request_id: &str) -> Response {
    if let Ok(v) = HeaderValue::from_str(request_id) {
        response.headers_mut().insert("x-request-id", v);
    }
    response
}

fn is_draining(state: &AppState) -> bool {
    !state.accepting_requests.load(Ordering::Relaxed)
}

pub(crate) fn api_error_response(err: &ApiError) -> Response {
    let status =
        StatusCode::from_u16(map_error(err)).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(json!({"error": err}))).into_response()
}

/// Terminal rejection path shared by every handler: map the error to its
/// status, record the observation, and tag the response.
async fn reject(
    state: &AppState,
    route: &str,
    started: Instant,
    request_id: &str,
    err: ApiError,
) -> Response {
    let response = api_error_response(&err);
    state
        .metrics
        .observe_request(route, response.status(), started.elapsed())
        .await;
    with_request_id(response, request_id)
}

async fn respond(
    state: &AppState,
    route: &str,
    started: Instant,
    request_id: &str,
    status: StatusCode,
    payload: Value,
) -> Response {
    let response = (status, Json(payload)).into_response();
    state
        .metrics
        .observe_request(route, status, started.elapsed())
        .await;
    with_request_id(response, request_id)
}

fn store_api_error(err: StoreError) -> ApiError {
    match err {
        StoreError::NotFound { product_id } => ApiError::product_not_found(&product_id),
        StoreError::Inactive { product_id } => ApiError::product_inactive(&product_id),
        StoreError::Duplicate { field, value } => ApiError::duplicate(field, &value),
        StoreError::InsufficientStock {
            product_id,
            available,
            requested,
        } => ApiError::insufficient_stock(&product_id, available, requested),
        StoreError::Invalid(msg) => ApiError::invalid_field("request", &msg),
        StoreError::Corrupt(msg) => ApiError::storage(&msg),
        StoreError::Sqlite(e) => ApiError::storage(&e.to_string()),
    }
}

fn parse_body<T: serde::de::DeserializeOwned>(body: Value) -> Result<T, ApiError> {
    serde_json::from_value(body).map_err(|e| ApiError::invalid_body(&e.to_string()))
}

/// Serializes a product and bolts on the derived stock level so clients
/// never recompute thresholds.
fn product_payload(product: &Product) -> Result<Value, ApiError> {
    let mut value =
        serde_json::to_value(product).map_err(|e| ApiError::storage(&e.to_string()))?;
    if let Value::Object(map) = &mut value {
        map.insert(
            "stock_level".to_string(),
            json!(product.stock_level().as_str()),
        );
    }
    Ok(value)
}

fn transaction_payload<T: serde::Serialize>(record: &T) -> Result<Value, ApiError> {
    serde_json::to_value(record).map_err(|e| ApiError::storage(&e.to_string()))
}

pub(crate) async fn health_handler(State(state): State<AppState>) -> Response {
    let started = Instant::now();
    let request_id = make_request_id(&state);
    respond(
        &state,
        "/health",
        started,
        &request_id,
        StatusCode::OK,
        json!({"status": "healthy", "timestamp": Utc::now()}),
    )
    .await
}

pub(crate) async fn api_health_handler(State(state): State<AppState>) -> Response {
    let started = Instant::now();
    let request_id = make_request_id(&state);
    respond(
        &state,
        "/api/health",
        started,
        &request_id,
        StatusCode::OK,
        json!({
            "status": "healthy",
            "service": SERVICE_NAME,
            "version": env!("CARGO_PKG_VERSION"),
            "config_schema_version": CONFIG_SCHEMA_VERSION,
            "timestamp": Utc::now()
        }),
    )
    .await
}

pub(crate) async fn metrics_handler(State(state): State<AppState>) -> Response {
    let started = Instant::now();
    let request_id = make_request_id(&state);
    let body = crate::telemetry::render_metrics(&state).await;
    let mut response = (StatusCode::OK, body).into_response();
    response.headers_mut().insert(
        "content-type",
        HeaderValue::from_static("text/plain; version=0.0.4"),
    );
    state
        .metrics
        .observe_request("/metrics", StatusCode::OK, started.elapsed())
        .await;
    with_request_id(response, &request_id)
}

pub(crate) async fn create_product_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    const ROUTE: &str = "/api/products/create";
    let started = Instant::now();
    let request_id = propagated_request_id(&headers, &state);
    if is_draining(&state) {
        return reject(&state, ROUTE, started, &request_id, ApiError::draining()).await;
    }
    let req: CreateProductRequest = match parse_body(body) {
        Ok(v) => v,
        Err(e) => return reject(&state, ROUTE, started, &request_id, e).await,
    };
    if let Err(e) = req.validate() {
        return reject(&state, ROUTE, started, &request_id, e).await;
    }

    let raw_id = generate_product_id(&req.category, &req.size);
    let product_id = match ProductId::parse(&raw_id) {
        Ok(v) => v,
        Err(e) => {
            return reject(
                &state,
                ROUTE,
                started,
                &request_id,
                ApiError::invalid_field("size", &e.to_string()),
            )
            .await
        }
    };
    let payload = QrPayload::new(
        product_id.clone(),
        req.name.clone(),
        req.category.clone(),
        req.size.clone(),
        req.color.clone(),
        Utc::now(),
    );
    let render = match render_product_qr(&payload) {
        Ok(v) => v,
        Err(e) => {
            return reject(
                &state,
                ROUTE,
                started,
                &request_id,
                ApiError::storage(&e.to_string()),
            )
            .await
        }
    };

    let sku = req
        .sku
        .clone()
        .unwrap_or_else(|| generate_sku(&req.category, &req.size, req.color.as_deref()));
    let new = NewProduct {
        product_id: product_id.clone(),
        name: req.name,
        category: req.category,
        size: req.size,
        color: req.color,
        sku: Some(sku),
        price: req.price,
        material: req.material,
        brand: req.brand,
        location: req.location,
        min_stock_level: req
            .min_stock_level
            .unwrap_or(state.api.default_min_stock_level),
        initial_quantity: req.initial_quantity,
        qr_payload: render.payload_json,
        qr_image: render.data_url.clone(),
    };

    let created = {
        let mut store = state.store.lock().await;
        store.create_product(new)
    };
    match created {
        Ok(created) => {
            info!(
                request_id = %request_id,
                product_id = %created.product.product_id,
                initial_quantity = created.product.quantity,
                "product created"
            );
            let payload = CreateProductResponse {
                success: true,
                product_id: created.product.product_id.as_str().to_string(),
                qr_code: render.data_url,
                message: "Product created successfully".to_string(),
            };
            match serde_json::to_value(&payload) {
                Ok(v) => respond(&state, ROUTE, started, &request_id, StatusCode::OK, v).await,
                Err(e) => {
                    reject(
                        &state,
                        ROUTE,
                        started,
                        &request_id,
                        ApiError::storage(&e.to_string()),
                    )
                    .await
                }
            }
        }
        Err(e) => reject(&state, ROUTE, started, &request_id, store_api_error(e)).await,
    }
}

pub(crate) async fn scan_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    const ROUTE: &str = "/api/inventory/scan";
    let started = Instant::now();
    let request_id = propagated_request_id(&headers, &state);
    if is_draining(&state) {
        return reject(&state, ROUTE, started, &request_id, ApiError::draining()).await;
    }
    let req: ScanRequest = match parse_body(body) {
        Ok(v) => v,
        Err(e) => return reject(&state, ROUTE, started, &request_id, e).await,
    };
    if let Err(e) = req.validate() {
        return reject(&state, ROUTE, started, &request_id, e).await;
    }

    // A malformed label and an unknown product are different failures; keep
    // them distinguishable for whoever is holding the scanner.
    let product_id = match QrPayload::decode_product_id(&req.qr_data) {
        Ok(v) => v,
        Err(e) => {
            return reject(
                &state,
                ROUTE,
                started,
                &request_id,
                ApiError::invalid_qr_payload(&e.to_string()),
            )
            .await
        }
    };
    let transaction_type = match TransactionType::parse_action(&req.action) {
        Ok(v) => v,
        Err(_) => {
            return reject(
                &state,
                ROUTE,
                started,
                &request_id,
                ApiError::invalid_action(&req.action),
            )
            .await
        }
    };

    let movement = MovementRequest {
        product_id,
        transaction_type,
        quantity: req.quantity,
        performed_by: req.performed_by,
        location: req.location,
        notes: req.notes,
    };
    let outcome = {
        let mut store = state.store.lock().await;
        store.apply_movement(&movement)
    };
    match outcome {
        Ok(outcome) => {
            info!(
                request_id = %request_id,
                product_id = %outcome.product.product_id,
                transaction_type = transaction_type.as_str(),
                quantity = movement.quantity,
                new_quantity = outcome.product.quantity,
                "stock movement applied"
            );
            let mut product = match product_payload(&outcome.product) {
                Ok(v) => v,
                Err(e) => return reject(&state, ROUTE, started, &request_id, e).await,
            };
            if let Value::Object(map) = &mut product {
                map.insert(
                    "previous_quantity".to_string(),
                    json!(outcome.previous_quantity),
                );
                map.insert("new_quantity".to_string(), json!(outcome.product.quantity));
            }
            let transaction = match transaction_payload(&outcome.transaction) {
                Ok(v) => v,
                Err(e) => return reject(&state, ROUTE, started, &request_id, e).await,
            };
            respond(
                &state,
                ROUTE,
                started,
                &request_id,
                StatusCode::OK,
                json!({"success": true, "product": product, "transaction": transaction}),
            )
            .await
        }
        Err(e) => {
            if let StoreError::InsufficientStock {
                product_id,
                available,
                requested,
            } = &e
            {
                warn!(
                    request_id = %request_id,
                    product_id = %product_id,
                    available,
                    requested,
                    "scan rejected: insufficient stock"
                );
            }
            reject(&state, ROUTE, started, &request_id, store_api_error(e)).await
        }
    }
}

pub(crate) async fn list_products_handler(
    State(state): State<AppState>,
    Query(params): Query<BTreeMap<String, String>>,
) -> Response {
    const ROUTE: &str = "/api/products";
    let started = Instant::now();
    let request_id = make_request_id(&state);
    let include_inactive = bool_flag(&params, "include_inactive");
    let listed = {
        let store = state.store.lock().await;
        store.list_products(include_inactive)
    };
    match listed {
        Ok(products) => {
            let mut rows = Vec::with_capacity(products.len());
            for product in &products {
                match product_payload(product) {
                    Ok(v) => rows.push(v),
                    Err(e) => return reject(&state, ROUTE, started, &request_id, e).await,
                }
            }
            respond(
                &state,
                ROUTE,
                started,
                &request_id,
                StatusCode::OK,
                json!({"products": rows, "count": rows.len()}),
            )
            .await
        }
        Err(e) => reject(&state, ROUTE, started, &request_id, store_api_error(e)).await,
    }
}

pub(crate) async fn get_product_handler(
    State(state): State<AppState>,
    AxumPath(product_id): AxumPath<String>,
) -> Response {
    const ROUTE: &str = "/api/products/{product_id}";
    let started = Instant::now();
    let request_id = make_request_id(&state);
    let fetched = {
        let store = state.store.lock().await;
        store.get_product(&product_id).and_then(|product| {
            let qr = store.get_qr(&product_id).ok();
            let recent = store.product_transactions(
                &product_id,
                Some(state.api.recent_transactions_limit),
            )?;
            Ok((product, qr, recent))
        })
    };
    match fetched {
        Ok((product, qr, recent)) => {
            let product = match product_payload(&product) {
                Ok(v) => v,
                Err(e) => return reject(&state, ROUTE, started, &request_id, e).await,
            };
            let recent = match transaction_payload(&recent) {
                Ok(v) => v,
                Err(e) => return reject(&state, ROUTE, started, &request_id, e).await,
            };
            respond(
                &state,
                ROUTE,
                started,
                &request_id,
                StatusCode::OK,
                json!({
                    "product": product,
                    "qr_code": qr.map(|q| q.qr_image),
                    "recent_transactions": recent
                }),
            )
            .await
        }
        Err(e) => reject(&state, ROUTE, started, &request_id, store_api_error(e)).await,
    }
}

pub(crate) async fn update_product_handler(
    State(state): State<AppState>,
    AxumPath(product_id): AxumPath<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    const ROUTE: &str = "/api/products/{product_id}";
    let started = Instant::now();
    let request_id = propagated_request_id(&headers, &state);
    if is_draining(&state) {
        return reject(&state, ROUTE, started, &request_id, ApiError::draining()).await;
    }
    let req: UpdateProductRequest = match parse_body(body) {
        Ok(v) => v,
        Err(e) => return reject(&state, ROUTE, started, &request_id, e).await,
    };
    if let Err(e) = req.validate() {
        return reject(&state, ROUTE, started, &request_id, e).await;
    }
    if req.is_empty() {
        return reject(
            &state,
            ROUTE,
            started,
            &request_id,
            ApiError::invalid_field("body", "at least one field must be provided"),
        )
        .await;
    }
    let patch = ProductPatch {
        name: req.name,
        category: req.category,
        size: req.size,
        color: req.color,
        sku: req.sku,
        price: req.price,
        material: req.material,
        brand: req.brand,
        location: req.location,
        min_stock_level: req.min_stock_level,
    };
    let updated = {
        let mut store = state.store.lock().await;
        store.update_product(&product_id, &patch)
    };
    match updated {
        Ok(product) => {
            let product = match product_payload(&product) {
                Ok(v) => v,
                Err(e) => return reject(&state, ROUTE, started, &request_id, e).await,
            };
            respond(
                &state,
                ROUTE,
                started,
                &request_id,
                StatusCode::OK,
                json!({"success": true, "product": product}),
            )
            .await
        }
        Err(e) => reject(&state, ROUTE, started, &request_id, store_api_error(e)).await,
    }
}

pub(crate) async fn delete_product_handler(
    State(state): State<AppState>,
    AxumPath(product_id): AxumPath<String>,
    headers: HeaderMap,
    Query(params): Query<BTreeMap<String, String>>,
) -> Response {
    const ROUTE: &str = "/api/products/{product_id}";
    let started = Instant::now();
    let request_id = propagated_request_id(&headers, &state);
    if is_draining(&state) {
        return reject(&state, ROUTE, started, &request_id, ApiError::draining()).await;
    }
    let performed_by = params
        .get("performed_by")
        .map(String::as_str)
        .filter(|v| !v.trim().is_empty())
        .unwrap_or("System");
    let deleted = {
        let mut store = state.store.lock().await;
        store.soft_delete_product(&product_id, performed_by)
    };
    match deleted {
        Ok((product, transaction)) => {
            info!(
                request_id = %request_id,
                product_id = %product.product_id,
                written_off = transaction.quantity,
                "product retired"
            );
            let product = match product_payload(&product) {
                Ok(v) => v,
                Err(e) => return reject(&state, ROUTE, started, &request_id, e).await,
            };
            let transaction = match transaction_payload(&transaction) {
                Ok(v) => v,
                Err(e) => return reject(&state, ROUTE, started, &request_id, e).await,
            };
            respond(
                &state,
                ROUTE,
                started,
                &request_id,
                StatusCode::OK,
                json!({"success": true, "product": product, "transaction": transaction}),
            )
            .await
        }
        Err(e) => reject(&state, ROUTE, started, &request_id, store_api_error(e)).await,
    }
}

pub(crate) async fn qr_handler(
    State(state): State<AppState>,
    AxumPath(product_id): AxumPath<String>,
) -> Response {
    const ROUTE: &str = "/api/qr/{product_id}";
    let started = Instant::now();
    let request_id = make_request_id(&state);
    let qr = {
        let store = state.store.lock().await;
        store.get_qr(&product_id)
    };
    match qr {
        Ok(record) => {
            respond(
                &state,
                ROUTE,
                started,
                &request_id,
                StatusCode::OK,
                json!({"qr_code": record.qr_image, "qr_payload": record.qr_payload}),
            )
            .await
        }
        Err(e) => reject(&state, ROUTE, started, &request_id, store_api_error(e)).await,
    }
}

pub(crate) async fn product_transactions_handler(
    State(state): State<AppState>,
    AxumPath(product_id): AxumPath<String>,
) -> Response {
    const ROUTE: &str = "/api/products/{product_id}/transactions";
    let started = Instant::now();
    let request_id = make_request_id(&state);
    let fetched = {
        let store = state.store.lock().await;
        store
            .get_product(&product_id)
            .and_then(|_| store.product_transactions(&product_id, None))
    };
    match fetched {
        Ok(transactions) => {
            let rows = match transaction_payload(&transactions) {
                Ok(v) => v,
                Err(e) => return reject(&state, ROUTE, started, &request_id, e).await,
            };
            respond(
                &state,
                ROUTE,
                started,
                &request_id,
                StatusCode::OK,
                json!({
                    "product_id": product_id,
                    "transactions": rows,
                    "count": transactions.len()
                }),
            )
            .await
        }
        Err(e) => reject(&state, ROUTE, started, &request_id, store_api_error(e)).await,
    }
}

pub(crate) async fn product_summary_handler(
    State(state): State<AppState>,
    AxumPath(product_id): AxumPath<String>,
) -> Response {
    const ROUTE: &str = "/api/products/{product_id}/summary";
    let started = Instant::now();
    let request_id = make_request_id(&state);
    let summary = {
        let store = state.store.lock().await;
        store.ledger_summary(&product_id)
    };
    match summary {
        Ok(summary) => {
            let payload = match transaction_payload(&summary) {
                Ok(v) => v,
                Err(e) => return reject(&state, ROUTE, started, &request_id, e).await,
            };
            respond(
                &state,
                ROUTE,
                started,
                &request_id,
                StatusCode::OK,
                json!({"product_id": product_id, "summary": payload}),
            )
            .await
        }
        Err(e) => reject(&state, ROUTE, started, &request_id, store_api_error(e)).await,
    }
}

pub(crate) async fn inventory_summary_handler(State(state): State<AppState>) -> Response {
    const ROUTE: &str = "/api/inventory/summary";
    let started = Instant::now();
    let request_id = make_request_id(&state);
    let summary = {
        let store = state.store.lock().await;
        store.inventory_summary()
    };
    match summary {
        Ok(summary) => {
            let rows = match transaction_payload(&summary.rows) {
                Ok(v) => v,
                Err(e) => return reject(&state, ROUTE, started, &request_id, e).await,
            };
            respond(
                &state,
                ROUTE,
                started,
                &request_id,
                StatusCode::OK,
                json!({
                    "summary_by_type_size": rows,
                    "total_items": summary.total_items
                }),
            )
            .await
        }
        Err(e) => reject(&state, ROUTE, started, &request_id, store_api_error(e)).await,
    }
}

pub(crate) async fn list_transactions_handler(
    State(state): State<AppState>,
    Query(params): Query<BTreeMap<String, String>>,
) -> Response {
    const ROUTE: &str = "/api/transactions";
    let started = Instant::now();
    let request_id = make_request_id(&state);
    let parsed = match parse_transaction_params(
        &params,
        state.api.default_transaction_limit,
        state.api.max_transaction_limit,
    ) {
        Ok(v) => v,
        Err(e) => return reject(&state, ROUTE, started, &request_id, e).await,
    };
    let filter = TransactionFilter {
        product_id: parsed.product_id,
        transaction_type: parsed.transaction_type,
        start_date: parsed.start_date,
        end_date: parsed.end_date,
        performed_by: parsed.performed_by,
        limit: parsed.limit,
    };
    let listed = {
        let store = state.store.lock().await;
        store.list_transactions(&filter)
    };
    match listed {
        Ok(entries) => {
            let rows = match transaction_payload(&entries) {
                Ok(v) => v,
                Err(e) => return reject(&state, ROUTE, started, &request_id, e).await,
            };
            respond(
                &state,
                ROUTE,
                started,
                &request_id,
                StatusCode::OK,
                json!({"transactions": rows, "count": entries.len()}),
            )
            .await
        }
        Err(e) => reject(&state, ROUTE, started, &request_id, store_api_error(e)).await,
    }
}

pub(crate) async fn dashboard_stats_handler(State(state): State<AppState>) -> Response {
    const ROUTE: &str = "/api/dashboard/stats";
    let started = Instant::now();
    let request_id = make_request_id(&state);
    let stats = {
        let store = state.store.lock().await;
        store.dashboard_stats(state.api.dashboard_recent_limit)
    };
    match stats {
        Ok(stats) => {
            let recent = match transaction_payload(&stats.recent) {
                Ok(v) => v,
                Err(e) => return reject(&state, ROUTE, started, &request_id, e).await,
            };
            respond(
                &state,
                ROUTE,
                started,
                &request_id,
                StatusCode::OK,
                json!({
                    "today_transactions": stats.today_transactions,
                    "total_transactions": stats.total_transactions,
                    "total_stock_in": stats.total_stock_in,
                    "total_stock_out": stats.total_stock_out,
                    "recent_transactions": recent
                }),
            )
            .await
        }
        Err(e) => reject(&state, ROUTE, started, &request_id, store_api_error(e)).await,
    }
}
