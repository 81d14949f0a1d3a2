//! Mock payment provider for testing.

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::payment::{
    CreateTransactionRequest, CreateTransactionResponse, GatewayType, PaymentError,
    PaymentNotification, PaymentProvider, PaymentStatus,
};

/// Mock implementation of the PaymentProvider trait.
///
/// Provides controllable behavior for testing:
/// - Successful transactions with predictable tokens and URLs
/// - Track transaction requests for assertions
/// - Simulate gateway failures, once or until cleared
/// - Simulate a slow gateway
///
/// Notifications use a small JSON shape whose `transaction_status` is already
/// normalized (`pending`, `paid`, `failed`, `expired`); build one with
/// [`MockPaymentProvider::notification`].
///
/// # Example
///
/// ```rust,ignore
/// use boxoffice_core::testing::MockPaymentProvider;
///
/// let provider = Arc::new(MockPaymentProvider::new());
/// provider.set_next_error(PaymentError::Http("connection reset".into())).await;
///
/// // ... register, then settle
/// let payload = MockPaymentProvider::notification(&order_number, "paid");
/// ```
pub struct MockPaymentProvider {
    gateway: GatewayType,
    /// Recorded transaction requests.
    requests: Arc<RwLock<Vec<CreateTransactionRequest>>>,
    /// If set, the next transaction fails with this error.
    next_error: Arc<RwLock<Option<PaymentError>>>,
    /// If set, every transaction fails with this message until cleared.
    failing: Arc<RwLock<Option<String>>>,
    /// How long each transaction takes to answer.
    delay: Arc<RwLock<Duration>>,
}

impl std::fmt::Debug for MockPaymentProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockPaymentProvider")
            .field("gateway", &self.gateway)
            .field("requests", &"<requests>")
            .field("next_error", &"<next_error>")
            .field("failing", &"<failing>")
            .field("delay", &"<delay>")
            .finish()
    }
}

impl Default for MockPaymentProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MockPaymentProvider {
    /// Create a mock that stands in for the Midtrans gateway.
    pub fn new() -> Self {
        Self {
            gateway: GatewayType::Midtrans,
            requests: Arc::new(RwLock::new(Vec::new())),
            next_error: Arc::new(RwLock::new(None)),
            failing: Arc::new(RwLock::new(None)),
            delay: Arc::new(RwLock::new(Duration::ZERO)),
        }
    }

    /// Make the next transaction fail with `error`.
    pub async fn set_next_error(&self, error: PaymentError) {
        *self.next_error.write().await = Some(error);
    }

    /// Make every transaction fail until [`Self::clear_failing`] is called.
    pub async fn set_failing(&self, message: impl Into<String>) {
        *self.failing.write().await = Some(message.into());
    }

    pub async fn clear_failing(&self) {
        *self.failing.write().await = None;
    }

    /// Make every transaction take `delay` before answering.
    pub async fn set_delay(&self, delay: Duration) {
        *self.delay.write().await = delay;
    }

    /// All transaction requests received so far, failed ones included.
    pub async fn recorded_requests(&self) -> Vec<CreateTransactionRequest> {
        self.requests.read().await.clone()
    }

    pub async fn request_count(&self) -> usize {
        self.requests.read().await.len()
    }

    /// Notification body this mock's `parse_webhook` understands.
    pub fn notification(order_number: &str, status: &str) -> Vec<u8> {
        serde_json::json!({
            "order_id": order_number,
            "transaction_id": format!("mock-tx-{}", order_number),
            "transaction_status": status,
            "payment_type": "bank_transfer",
        })
        .to_string()
        .into_bytes()
    }
}

#[derive(Debug, Deserialize)]
struct MockNotification {
    order_id: String,
    transaction_status: String,
    #[serde(default)]
    transaction_id: Option<String>,
    #[serde(default)]
    payment_type: Option<String>,
}

#[async_trait]
impl PaymentProvider for MockPaymentProvider {
    fn gateway(&self) -> GatewayType {
        self.gateway
    }

    async fn create_transaction(
        &self,
        request: &CreateTransactionRequest,
    ) -> Result<CreateTransactionResponse, PaymentError> {
        self.requests.write().await.push(request.clone());

        let delay = *self.delay.read().await;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        if let Some(error) = self.next_error.write().await.take() {
            return Err(error);
        }
        if let Some(message) = self.failing.read().await.clone() {
            return Err(PaymentError::Gateway {
                status: 503,
                message,
            });
        }

        Ok(CreateTransactionResponse {
            token: format!("mock-token-{}", request.order_number),
            redirect_url: format!("https://pay.example.test/{}", request.order_number),
            transaction_id: None,
        })
    }

    fn parse_webhook(&self, payload: &[u8]) -> Result<PaymentNotification, PaymentError> {
        let notification: MockNotification = serde_json::from_slice(payload)
            .map_err(|e| PaymentError::InvalidPayload(e.to_string()))?;
        let status = PaymentStatus::parse(&notification.transaction_status).ok_or_else(|| {
            PaymentError::UnsupportedStatus(notification.transaction_status.clone())
        })?;

        Ok(PaymentNotification {
            order_number: notification.order_id,
            transaction_id: notification.transaction_id,
            status,
            payment_type: notification.payment_type,
            gateway: self.gateway,
            raw_payload: String::from_utf8_lossy(payload).into_owned(),
        })
    }
}
