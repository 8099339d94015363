// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Admin API tests against a full desk with a mock transport.

use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode};
use parley_core::types::Variant;
use parley_gateway::{ADMIN_HEADER, GatewayState, app};
use parley_test_utils::TestHarness;
use serde_json::Value;
use tower::ServiceExt;

const ADMIN: i64 = 1;
const CUSTOMER: i64 = 100;

fn api(harness: &TestHarness) -> axum::Router {
    let state = GatewayState::new(
        harness.router().clone(),
        &harness.config().telegram.admin_ids,
    );
    app(state)
}

async fn call(
    harness: &TestHarness,
    method: &str,
    uri: &str,
    admin: Option<i64>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(admin) = admin {
        builder = builder.header(ADMIN_HEADER, admin.to_string());
    }
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = api(harness).oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

#[tokio::test]
async fn health_is_public() {
    let harness = TestHarness::builder().build().await.unwrap();
    let (status, body) = call(&harness, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn admin_routes_require_an_allow_listed_id() {
    let harness = TestHarness::builder().build().await.unwrap();

    let (status, _) = call(&harness, "GET", "/v1/stats", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = call(&harness, "GET", "/v1/stats", Some(CUSTOMER), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = call(&harness, "GET", "/v1/stats", Some(ADMIN), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn empty_allow_list_fails_closed() {
    let harness = TestHarness::builder()
        .with_admins(Vec::new())
        .build()
        .await
        .unwrap();
    let (status, _) = call(&harness, "GET", "/v1/dashboard", Some(ADMIN), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn dashboard_lists_waiting_chats() {
    let harness = TestHarness::builder().build().await.unwrap();
    harness.customer_says(CUSTOMER, "my router is broken").await;

    let (status, body) = call(&harness, "GET", "/v1/dashboard", Some(ADMIN), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["variant"], "threaded");
    assert_eq!(body["needs_attention"], 1);
    assert_eq!(body["waiting"]["total"], 1);
    assert_eq!(body["waiting"]["items"][0]["customer"]["external_id"], CUSTOMER);
}

#[tokio::test]
async fn listing_rejects_status_of_other_variant() {
    let harness = TestHarness::builder()
        .with_variant(Variant::Ticketed)
        .build()
        .await
        .unwrap();
    let (status, _) = call(
        &harness,
        "GET",
        "/v1/conversations?status=archived",
        Some(ADMIN),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = call(
        &harness,
        "GET",
        "/v1/conversations?status=open&page=0",
        Some(ADMIN),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 0);
}

#[tokio::test]
async fn viewing_a_chat_marks_it_read() {
    let harness = TestHarness::builder().build().await.unwrap();
    harness.customer_says(CUSTOMER, "hello?").await;

    let (status, body) = call(&harness, "GET", "/v1/conversations/1", Some(ADMIN), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["conversation"]["unread_count"], 0);
    assert_eq!(body["messages"]["items"][0]["content"], "hello?");

    let (status, _) = call(&harness, "GET", "/v1/conversations/99", Some(ADMIN), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn http_reply_reaches_the_customer() {
    let harness = TestHarness::builder()
        .with_variant(Variant::Ticketed)
        .build()
        .await
        .unwrap();
    harness.customer_says(CUSTOMER, "printer jammed").await;

    let (status, body) = call(
        &harness,
        "POST",
        "/v1/conversations/1/reply",
        Some(ADMIN),
        Some(serde_json::json!({ "text": "open tray 2" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["conversation"]["status"], "answered");
    assert_eq!(body["still_replying"], false);

    let delivered = harness.sent_to(CUSTOMER).await;
    assert!(delivered.last().unwrap().text.ends_with("open tray 2"));
}

#[tokio::test]
async fn reply_to_closed_ticket_conflicts() {
    let harness = TestHarness::builder()
        .with_variant(Variant::Ticketed)
        .build()
        .await
        .unwrap();
    harness.customer_says(CUSTOMER, "printer jammed").await;

    let (status, body) = call(&harness, "POST", "/v1/conversations/1/close", Some(ADMIN), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "closed");

    let (status, _) = call(
        &harness,
        "POST",
        "/v1/conversations/1/reply",
        Some(ADMIN),
        Some(serde_json::json!({ "text": "too late" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = call(
        &harness,
        "POST",
        "/v1/conversations/1/reply",
        Some(ADMIN),
        Some(serde_json::json!({ "text": "   " })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn stats_count_each_status() {
    let harness = TestHarness::builder().build().await.unwrap();
    harness.customer_says(CUSTOMER, "one").await;
    harness.customer_says(101, "two").await;

    let (status, body) = call(&harness, "GET", "/v1/stats", Some(ADMIN), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 2);
    assert_eq!(body["by_status"][0]["status"], "active");
    assert_eq!(body["by_status"][0]["count"], 2);
}
