// SPDX-License-Identifier: Apache-2.0

mod support;

use support::{create_product, request_json, scan_body, spawn_server};

#[tokio::test]
async fn integration_create_then_scan_flow() {
    let addr = spawn_server().await;
    let (product_id, qr_payload) = create_product(addr, "Blue Shirt", 10).await;

    // Opening balance: exactly one INITIAL_STOCK row with a 0 -> 10 snapshot.
    let (status, history) = request_json(
        addr,
        "GET",
        &format!("/api/products/{product_id}/transactions"),
        None,
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(history["count"], 1);
    let initial = &history["transactions"][0];
    assert_eq!(initial["transaction_type"], "INITIAL_STOCK");
    assert_eq!(initial["previous_stock"], 0);
    assert_eq!(initial["new_stock"], 10);
    assert_eq!(initial["performed_by"], "System");

    // Scan three out.
    let (status, scanned) = request_json(
        addr,
        "POST",
        "/api/inventory/scan",
        Some(&scan_body(&qr_payload, "OUT", 3, "Asha")),
    )
    .await;
    assert_eq!(status, 200, "scan failed: {scanned}");
    assert_eq!(scanned["success"], true);
    assert_eq!(scanned["product"]["previous_quantity"], 10);
    assert_eq!(scanned["product"]["new_quantity"], 7);
    assert_eq!(scanned["transaction"]["transaction_type"], "STOCK_OUT");
    assert_eq!(scanned["transaction"]["previous_stock"], 10);
    assert_eq!(scanned["transaction"]["new_stock"], 7);

    // Requesting twenty more is a terminal rejection carrying both numbers.
    let (status, rejected) = request_json(
        addr,
        "POST",
        "/api/inventory/scan",
        Some(&scan_body(&qr_payload, "OUT", 20, "Asha")),
    )
    .await;
    assert_eq!(status, 400);
    assert_eq!(rejected["error"]["code"], "InsufficientStock");
    assert_eq!(rejected["error"]["details"]["current_quantity"], 7);
    assert_eq!(rejected["error"]["details"]["requested"], 20);

    // The rejection left nothing behind.
    let (status, product) =
        request_json(addr, "GET", &format!("/api/products/{product_id}"), None).await;
    assert_eq!(status, 200);
    assert_eq!(product["product"]["quantity"], 7);
    assert_eq!(product["product"]["stock_level"], "low-stock");
    assert!(product["qr_code"]
        .as_str()
        .is_some_and(|v| v.starts_with("data:image/svg+xml;base64,")));

    let (status, summary) = request_json(
        addr,
        "GET",
        &format!("/api/products/{product_id}/summary"),
        None,
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(summary["summary"]["total_stock_in"], 10);
    assert_eq!(summary["summary"]["total_stock_out"], 3);
    assert_eq!(summary["summary"]["net_stock"], 7);
    assert_eq!(summary["summary"]["transaction_count"], 2);
}

#[tokio::test]
async fn integration_scan_accepts_in_and_return_directions() {
    let addr = spawn_server().await;
    let (_, qr_payload) = create_product(addr, "Linen Kurta", 5).await;

    let (status, scanned) = request_json(
        addr,
        "POST",
        "/api/inventory/scan",
        Some(&scan_body(&qr_payload, "IN", 4, "Ravi")),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(scanned["transaction"]["transaction_type"], "STOCK_IN");
    assert_eq!(scanned["product"]["new_quantity"], 9);

    let (status, sold) = request_json(
        addr,
        "POST",
        "/api/inventory/scan",
        Some(&scan_body(&qr_payload, "SALE", 2, "Ravi")),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(sold["transaction"]["transaction_type"], "SALE");
    assert_eq!(sold["product"]["new_quantity"], 7);

    let (status, returned) = request_json(
        addr,
        "POST",
        "/api/inventory/scan",
        Some(&scan_body(&qr_payload, "RETURN", 1, "Ravi")),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(returned["transaction"]["transaction_type"], "RETURN");
    assert_eq!(returned["product"]["new_quantity"], 8);
}

#[tokio::test]
async fn integration_inventory_summary_reflects_movements() {
    let addr = spawn_server().await;
    let (_, shirt_payload) = create_product(addr, "Blue Shirt", 10).await;
    create_product(addr, "Red Shirt", 5).await;

    let (status, _) = request_json(
        addr,
        "POST",
        "/api/inventory/scan",
        Some(&scan_body(&shirt_payload, "OUT", 4, "Asha")),
    )
    .await;
    assert_eq!(status, 200);

    let (status, summary) = request_json(addr, "GET", "/api/inventory/summary", None).await;
    assert_eq!(status, 200);
    assert_eq!(summary["total_items"], 11);
    let rows = summary["summary_by_type_size"].as_array().expect("rows");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["category"], "Shirt");
    assert_eq!(rows[0]["size"], "M");
    assert_eq!(rows[0]["total_quantity"], 11);
    assert_eq!(rows[0]["product_count"], 2);

    let (status, stats) = request_json(addr, "GET", "/api/dashboard/stats", None).await;
    assert_eq!(status, 200);
    assert_eq!(stats["total_transactions"], 3);
    assert_eq!(stats["total_stock_in"], 15);
    assert_eq!(stats["total_stock_out"], 4);
}
