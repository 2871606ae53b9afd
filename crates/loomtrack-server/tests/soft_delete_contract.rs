// SPDX-License-Identifier: Apache-2.0

mod support;

use support::{create_product, request_json, scan_body, spawn_server};

#[tokio::test]
async fn integration_soft_delete_hides_but_keeps_history() {
    let addr = spawn_server().await;
    let (kept_id, _) = create_product(addr, "Blue Shirt", 10).await;
    let (retired_id, retired_payload) = create_product(addr, "Linen Kurta", 4).await;

    let (status, deleted) = request_json(
        addr,
        "DELETE",
        &format!("/api/products/{retired_id}?performed_by=Asha"),
        None,
    )
    .await;
    assert_eq!(status, 200, "delete failed: {deleted}");
    assert_eq!(deleted["success"], true);
    assert_eq!(deleted["product"]["status"], "inactive");
    assert_eq!(deleted["product"]["quantity"], 0);
    assert_eq!(deleted["transaction"]["transaction_type"], "ADJUSTMENT");
    assert_eq!(deleted["transaction"]["previous_stock"], 4);
    assert_eq!(deleted["transaction"]["new_stock"], 0);
    assert_eq!(deleted["transaction"]["performed_by"], "Asha");

    // Default listing hides the retired product.
    let (status, listing) = request_json(addr, "GET", "/api/products", None).await;
    assert_eq!(status, 200);
    assert_eq!(listing["count"], 1);
    assert_eq!(listing["products"][0]["product_id"], kept_id.as_str());

    let (status, listing) =
        request_json(addr, "GET", "/api/products?include_inactive=1", None).await;
    assert_eq!(status, 200);
    assert_eq!(listing["count"], 2);

    // History stays reachable by id.
    let (status, history) = request_json(
        addr,
        "GET",
        &format!("/api/products/{retired_id}/transactions"),
        None,
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(history["count"], 2);

    let (status, fetched) =
        request_json(addr, "GET", &format!("/api/products/{retired_id}"), None).await;
    assert_eq!(status, 200);
    assert_eq!(fetched["product"]["status"], "inactive");

    // Retired products accept no further movements or deletes.
    let (status, scanned) = request_json(
        addr,
        "POST",
        "/api/inventory/scan",
        Some(&scan_body(&retired_payload, "IN", 1, "Asha")),
    )
    .await;
    assert_eq!(status, 409);
    assert_eq!(scanned["error"]["code"], "ProductInactive");

    let (status, again) = request_json(
        addr,
        "DELETE",
        &format!("/api/products/{retired_id}"),
        None,
    )
    .await;
    assert_eq!(status, 409);
    assert_eq!(again["error"]["code"], "ProductInactive");
}

#[tokio::test]
async fn integration_update_edits_attributes_until_retirement() {
    let addr = spawn_server().await;
    let (product_id, _) = create_product(addr, "Blue Shirt", 6).await;

    let (status, updated) = request_json(
        addr,
        "PUT",
        &format!("/api/products/{product_id}"),
        Some("{\"name\":\"Indigo Shirt\",\"price\":1299.0}"),
    )
    .await;
    assert_eq!(status, 200, "update failed: {updated}");
    assert_eq!(updated["product"]["name"], "Indigo Shirt");
    assert_eq!(updated["product"]["price"], 1299.0);
    assert_eq!(updated["product"]["quantity"], 6);

    let (status, empty) = request_json(
        addr,
        "PUT",
        &format!("/api/products/{product_id}"),
        Some("{}"),
    )
    .await;
    assert_eq!(status, 400);
    assert_eq!(empty["error"]["code"], "InvalidField");

    let (status, _) = request_json(
        addr,
        "DELETE",
        &format!("/api/products/{product_id}"),
        None,
    )
    .await;
    assert_eq!(status, 200);

    let (status, refused) = request_json(
        addr,
        "PUT",
        &format!("/api/products/{product_id}"),
        Some("{\"name\":\"Ghost Shirt\"}"),
    )
    .await;
    assert_eq!(status, 409);
    assert_eq!(refused["error"]["code"], "ProductInactive");
}
