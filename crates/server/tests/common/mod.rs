//! Common test utilities for E2E testing with a mock payment gateway.
//!
//! The fixture builds the real router over a throwaway SQLite database and
//! a [`MockPaymentProvider`], so requests run the full stack in-process.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use boxoffice_core::{load_config_from_str, Database, TicketType};
use boxoffice_server::{api::create_router, state::AppState};

/// Re-export fixtures for test convenience
pub use boxoffice_core::testing::{fixtures, MockPaymentProvider};

/// Test fixture for E2E testing.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_registration() {
///     let fixture = TestFixture::new();
///     let gold = fixture.ticket_type("Gold", 150_000, 10);
///
///     let response = fixture
///         .post("/api/v1/registrations", fixture.registration(&[&gold.id]))
///         .await;
///
///     assert_eq!(response.status, 201);
/// }
/// ```
pub struct TestFixture {
    pub router: Router,
    pub db: Database,
    /// Mock gateway; inspect requests or script failures.
    pub payments: Arc<MockPaymentProvider>,
    pub temp_dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestFixture {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("test.db");

        let config = load_config_from_str(&format!(
            r#"
[server]
host = "127.0.0.1"
port = 0

[database]
path = "{}"

[registration]
code_prefix = "JMF"

[payment.midtrans]
server_key = "test-server-key"
"#,
            db_path.display()
        ))
        .expect("Failed to parse test config");

        let db = Database::open(&db_path).expect("Failed to open database");
        let payments = Arc::new(MockPaymentProvider::new());
        let state = Arc::new(AppState::new(
            config,
            db.clone(),
            fixtures::gateways(Arc::clone(&payments)),
        ));

        Self {
            router: create_router(state),
            db,
            payments,
            temp_dir,
        }
    }

    /// Seed a ticket type directly in the database.
    pub fn ticket_type(&self, title: &str, price: i64, total: i64) -> TicketType {
        fixtures::ticket_type(&self.db, title, price, total)
    }

    pub fn reload(&self, ticket: &TicketType) -> TicketType {
        fixtures::reload(&self.db, &ticket.id)
    }

    /// Registration body with one participant per ticket id.
    pub fn registration(&self, ticket_ids: &[&str]) -> Value {
        serde_json::to_value(fixtures::register_request(ticket_ids))
            .expect("Failed to serialize request")
    }

    /// Deliver a mock gateway notification.
    pub async fn notify(&self, order_number: &str, status: &str) -> TestResponse {
        let payload = MockPaymentProvider::notification(order_number, status);
        self.request_raw(
            "POST",
            "/api/v1/webhooks/payment/midtrans",
            payload,
            "application/json",
        )
        .await
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, None).await
    }

    /// Send a POST request with JSON body.
    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.request("POST", path, Some(body)).await
    }

    /// Send a PUT request with JSON body.
    pub async fn put(&self, path: &str, body: Value) -> TestResponse {
        self.request("PUT", path, Some(body)).await
    }

    /// Send a DELETE request.
    pub async fn delete(&self, path: &str) -> TestResponse {
        self.request("DELETE", path, None).await
    }

    /// Send a POST request with raw string body (for testing malformed JSON).
    pub async fn post_raw(&self, path: &str, body: &str) -> TestResponse {
        self.request_raw("POST", path, body.as_bytes().to_vec(), "application/json")
            .await
    }

    async fn request_raw(
        &self,
        method: &str,
        path: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> TestResponse {
        let request = Request::builder()
            .method(method)
            .uri(path)
            .header("Content-Type", content_type)
            .body(Body::from(body))
            .unwrap();

        self.send(request).await
    }

    async fn request(&self, method: &str, path: &str, body: Option<Value>) -> TestResponse {
        let mut request_builder = Request::builder().method(method).uri(path);

        let body = if let Some(json_body) = body {
            request_builder = request_builder.header("Content-Type", "application/json");
            Body::from(serde_json::to_vec(&json_body).unwrap())
        } else {
            Body::empty()
        };

        self.send(request_builder.body(body).unwrap()).await
    }

    async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&body_bytes).into_owned()))
        };

        TestResponse { status, body }
    }
}

/// Helper to assert a response has expected status.
#[macro_export]
macro_rules! assert_status {
    ($response:expr, $status:expr) => {
        assert_eq!(
            $response.status, $status,
            "Expected status {:?}, got {:?}. Body: {}",
            $status,
            $response.status,
            serde_json::to_string_pretty(&$response.body).unwrap_or_default()
        );
    };
}

/// Helper to assert a JSON path equals expected value.
#[macro_export]
macro_rules! assert_json_path {
    ($json:expr, $path:expr, $expected:expr) => {
        let actual = &$json[$path];
        assert_eq!(
            actual, &$expected,
            "Path '{}' expected {:?}, got {:?}",
            $path, $expected, actual
        );
    };
}
