// SPDX-License-Identifier: Apache-2.0

// Not every test binary uses every helper.
#![allow(dead_code)]

use loomtrack_server::{build_router, AppState};
use loomtrack_store::InventoryStore;
use serde_json::Value;
use std::net::SocketAddr;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

pub async fn spawn_server() -> SocketAddr {
    let store = InventoryStore::open_in_memory().expect("open in-memory store");
    let app = build_router(AppState::new(store));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind listener");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve app");
    });
    addr
}

pub async fn request(
    addr: SocketAddr,
    method: &str,
    path: &str,
    body: Option<&str>,
) -> (u16, String) {
    let mut stream = tokio::net::TcpStream::connect(addr)
        .await
        .expect("connect server");
    let body = body.unwrap_or("");
    let request = format!(
        "{method} {path} HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n\
         Content-Type: application/json\r\nContent-Length: {}\r\n\r\n{body}",
        body.len()
    );
    stream
        .write_all(request.as_bytes())
        .await
        .expect("write request");

    let mut raw = String::new();
    stream.read_to_string(&mut raw).await.expect("read response");

    let status = raw
        .split_whitespace()
        .nth(1)
        .and_then(|s| s.parse::<u16>().ok())
        .expect("status line");
    let body = raw
        .split_once("\r\n\r\n")
        .map(|(_, b)| b.to_string())
        .unwrap_or_default();
    (status, body)
}

pub async fn request_json(
    addr: SocketAddr,
    method: &str,
    path: &str,
    body: Option<&str>,
) -> (u16, Value) {
    let (status, body) = request(addr, method, path, body).await;
    let value = serde_json::from_str(&body)
        .unwrap_or_else(|e| panic!("response body is not json ({e}): {body}"));
    (status, value)
}

pub async fn create_product(addr: SocketAddr, name: &str, initial_quantity: i64) -> (String, String) {
    let body = format!(
        "{{\"name\":\"{name}\",\"type\":\"Shirt\",\"size\":\"M\",\"color\":\"Blue\",\
         \"initial_quantity\":{initial_quantity}}}"
    );
    let (status, value) = request_json(addr, "POST", "/api/products/create", Some(&body)).await;
    assert_eq!(status, 200, "create failed: {value}");
    let product_id = value["product_id"].as_str().expect("product_id").to_string();

    let (status, qr) = request_json(addr, "GET", &format!("/api/qr/{product_id}"), None).await;
    assert_eq!(status, 200, "qr fetch failed: {qr}");
    let qr_payload = qr["qr_payload"].as_str().expect("qr_payload").to_string();
    (product_id, qr_payload)
}

pub fn scan_body(qr_payload: &str, action: &str, quantity: i64, performed_by: &str) -> String {
    let payload = serde_json::to_string(qr_payload).expect("encode payload string");
    format!(
        "{{\"qr_data\":{payload},\"action\":\"{action}\",\"quantity\":{quantity},\
         \"performed_by\":\"{performed_by}\"}}"
    )
}
