//! End-to-end API tests with a mocked payment gateway.
//!
//! These run the full router in-process: registration, webhook settlement,
//! order lookup and ticket type administration.

mod common;

use axum::http::StatusCode;
use serde_json::json;

use boxoffice_core::PaymentError;
use common::TestFixture;

// =============================================================================
// Basic API Tests
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let fixture = TestFixture::new();
    let response = fixture.get("/api/v1/health").await;
    assert_status!(response, StatusCode::OK);
    assert_json_path!(response.body, "status", json!("ok"));
}

#[tokio::test]
async fn test_config_hides_server_key() {
    let fixture = TestFixture::new();
    let response = fixture.get("/api/v1/config").await;
    assert_status!(response, StatusCode::OK);
    assert_eq!(
        response.body["payment"]["midtrans"]["server_key_configured"],
        true
    );
    assert!(!response.body.to_string().contains("test-server-key"));
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let fixture = TestFixture::new();
    fixture.get("/api/v1/health").await;

    let response = fixture.get("/api/v1/metrics").await;
    assert_status!(response, StatusCode::OK);
    let text = response.body.as_str().expect("metrics are plain text");
    assert!(text.contains("boxoffice_http_requests_total"));
}

// =============================================================================
// Registration and Settlement
// =============================================================================

#[tokio::test]
async fn test_register_then_paid_webhook() {
    let fixture = TestFixture::new();
    let gold = fixture.ticket_type("Gold", 150_000, 10);

    let response = fixture
        .post(
            "/api/v1/registrations",
            fixture.registration(&[&gold.id, &gold.id, &gold.id]),
        )
        .await;
    assert_status!(response, StatusCode::CREATED);
    assert_json_path!(response.body, "amount", json!(450_000));
    assert_json_path!(response.body, "payment_status", json!("pending"));
    let order_number = response.body["order_number"].as_str().unwrap().to_string();

    let booked = fixture.reload(&gold);
    assert_eq!((booked.available, booked.booked, booked.sold), (7, 3, 0));

    let webhook = fixture.notify(&order_number, "paid").await;
    assert_status!(webhook, StatusCode::OK);
    assert_json_path!(webhook.body, "outcome", json!("applied"));
    assert_json_path!(webhook.body, "to", json!("paid"));

    let sold = fixture.reload(&gold);
    assert_eq!((sold.available, sold.booked, sold.sold), (7, 0, 3));

    let order = fixture
        .get(&format!("/api/v1/orders/{}", order_number))
        .await;
    assert_status!(order, StatusCode::OK);
    assert_eq!(order.body["order"]["payment_status"], "paid");
    assert_eq!(order.body["registrant"]["status"], "paid");
    assert_eq!(order.body["attendees"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_duplicate_webhook_acknowledged_once() {
    let fixture = TestFixture::new();
    let gold = fixture.ticket_type("Gold", 150_000, 1);

    let response = fixture
        .post("/api/v1/registrations", fixture.registration(&[&gold.id]))
        .await;
    assert_status!(response, StatusCode::CREATED);
    let order_number = response.body["order_number"].as_str().unwrap().to_string();
    assert_eq!(fixture.reload(&gold).status.as_str(), "BOOKOUT");

    assert_status!(fixture.notify(&order_number, "paid").await, StatusCode::OK);
    let again = fixture.notify(&order_number, "paid").await;
    assert_status!(again, StatusCode::OK);
    assert_json_path!(again.body, "outcome", json!("duplicate"));

    let sold = fixture.reload(&gold);
    assert_eq!((sold.available, sold.booked, sold.sold), (0, 0, 1));
    assert_eq!(sold.status.as_str(), "SOLD");
}

#[tokio::test]
async fn test_too_many_tickets_is_unprocessable() {
    let fixture = TestFixture::new();
    let gold = fixture.ticket_type("Gold", 150_000, 10);
    let ids = [gold.id.as_str(); 5];

    let response = fixture
        .post("/api/v1/registrations", fixture.registration(&ids))
        .await;
    assert_status!(response, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(response.body["error"].as_str().unwrap().contains("Too many tickets"));
    assert_eq!(fixture.reload(&gold).available, 10);
}

#[tokio::test]
async fn test_sold_out_is_conflict() {
    let fixture = TestFixture::new();
    let gold = fixture.ticket_type("Gold", 150_000, 1);

    let response = fixture
        .post(
            "/api/v1/registrations",
            fixture.registration(&[&gold.id, &gold.id]),
        )
        .await;
    assert_status!(response, StatusCode::CONFLICT);
    assert_eq!(fixture.reload(&gold).available, 1);
}

#[tokio::test]
async fn test_unknown_ticket_is_not_found() {
    let fixture = TestFixture::new();
    let response = fixture
        .post("/api/v1/registrations", fixture.registration(&["nope"]))
        .await;
    assert_status!(response, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_invalid_email_is_unprocessable() {
    let fixture = TestFixture::new();
    let gold = fixture.ticket_type("Gold", 150_000, 10);
    let mut body = fixture.registration(&[&gold.id]);
    body["registrant"]["email"] = json!("not-an-email");

    let response = fixture.post("/api/v1/registrations", body).await;
    assert_status!(response, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_gateway_failure_is_bad_gateway_and_restores_stock() {
    let fixture = TestFixture::new();
    let gold = fixture.ticket_type("Gold", 150_000, 10);
    fixture
        .payments
        .set_next_error(PaymentError::Http("connection reset".to_string()))
        .await;

    let response = fixture
        .post(
            "/api/v1/registrations",
            fixture.registration(&[&gold.id, &gold.id]),
        )
        .await;
    assert_status!(response, StatusCode::BAD_GATEWAY);
    assert_eq!(fixture.reload(&gold).available, 10);
}

// =============================================================================
// Webhook Errors
// =============================================================================

#[tokio::test]
async fn test_webhook_unknown_gateway() {
    let fixture = TestFixture::new();
    let response = fixture
        .post_raw("/api/v1/webhooks/payment/paypal", "{}")
        .await;
    assert_status!(response, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_webhook_malformed_payload() {
    let fixture = TestFixture::new();
    let response = fixture
        .post_raw("/api/v1/webhooks/payment/midtrans", "not json")
        .await;
    assert_status!(response, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_webhook_unknown_order() {
    let fixture = TestFixture::new();
    let response = fixture.notify("JMF2026-00000000", "paid").await;
    assert_status!(response, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_order_not_found() {
    let fixture = TestFixture::new();
    let response = fixture.get("/api/v1/orders/JMF2026-00000000").await;
    assert_status!(response, StatusCode::NOT_FOUND);
    assert!(response.body["error"].is_string());
}

// =============================================================================
// Ticket Type Administration
// =============================================================================

#[tokio::test]
async fn test_ticket_type_crud() {
    let fixture = TestFixture::new();

    let created = fixture
        .post(
            "/api/v1/ticket-types",
            json!({
                "kind": "GOLD",
                "title": "Gold",
                "price": 150000,
                "total": 20,
                "order_priority": 1
            }),
        )
        .await;
    assert_status!(created, StatusCode::CREATED);
    assert_json_path!(created.body, "available", json!(20));
    assert_json_path!(created.body, "status", json!("AVAILABLE"));
    let id = created.body["id"].as_str().unwrap().to_string();

    let updated = fixture
        .put(
            &format!("/api/v1/ticket-types/{}", id),
            json!({ "title": "Gold Plus", "total": 25 }),
        )
        .await;
    assert_status!(updated, StatusCode::OK);
    assert_json_path!(updated.body, "title", json!("Gold Plus"));
    assert_json_path!(updated.body, "available", json!(25));

    let listed = fixture.get("/api/v1/ticket-types").await;
    assert_status!(listed, StatusCode::OK);
    assert_eq!(listed.body.as_array().unwrap().len(), 1);

    let deleted = fixture.delete(&format!("/api/v1/ticket-types/{}", id)).await;
    assert_status!(deleted, StatusCode::OK);
    assert_json_path!(deleted.body, "deleted", json!(true));

    let listed = fixture.get("/api/v1/ticket-types").await;
    assert!(listed.body.as_array().unwrap().is_empty());
    let with_deleted = fixture
        .get("/api/v1/ticket-types?include_deleted=true")
        .await;
    assert_eq!(with_deleted.body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_total_below_committed_is_conflict() {
    let fixture = TestFixture::new();
    let gold = fixture.ticket_type("Gold", 150_000, 5);

    let response = fixture
        .post(
            "/api/v1/registrations",
            fixture.registration(&[&gold.id, &gold.id, &gold.id]),
        )
        .await;
    assert_status!(response, StatusCode::CREATED);

    let update = fixture
        .put(
            &format!("/api/v1/ticket-types/{}", gold.id),
            json!({ "total": 2 }),
        )
        .await;
    assert_status!(update, StatusCode::CONFLICT);

    let unchanged = fixture.reload(&gold);
    assert_eq!(
        (unchanged.total, unchanged.available, unchanged.booked),
        (5, 2, 3)
    );
}

#[tokio::test]
async fn test_create_ticket_type_rejects_negative_total() {
    let fixture = TestFixture::new();
    let response = fixture
        .post(
            "/api/v1/ticket-types",
            json!({ "kind": "GOLD", "title": "Gold", "price": 1, "total": -1 }),
        )
        .await;
    assert_status!(response, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_get_missing_ticket_type() {
    let fixture = TestFixture::new();
    let response = fixture.get("/api/v1/ticket-types/missing").await;
    assert_status!(response, StatusCode::NOT_FOUND);
}
