//! Midtrans Snap gateway.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha512};
use tracing::{debug, warn};

use super::provider::PaymentProvider;
use super::types::{
    CreateTransactionRequest, CreateTransactionResponse, GatewayType, PaymentError,
    PaymentNotification, PaymentStatus,
};
use crate::config::MidtransConfig;

const SANDBOX_URL: &str = "https://app.sandbox.midtrans.com";
const PRODUCTION_URL: &str = "https://app.midtrans.com";

/// Midtrans Snap provider.
pub struct MidtransProvider {
    client: Client,
    server_key: String,
    base_url: String,
    verify_signature: bool,
}

impl MidtransProvider {
    pub fn new(config: &MidtransConfig) -> Result<Self, PaymentError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .build()
            .map_err(|e| PaymentError::Http(e.to_string()))?;

        let base_url = if config.production {
            PRODUCTION_URL
        } else {
            SANDBOX_URL
        };

        Ok(Self {
            client,
            server_key: config.server_key.clone(),
            base_url: base_url.to_string(),
            verify_signature: config.verify_signature,
        })
    }

    /// Point the provider at a different Snap host.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn signature_for(&self, order_id: &str, status_code: &str, gross_amount: &str) -> String {
        let mut hasher = Sha512::new();
        hasher.update(order_id.as_bytes());
        hasher.update(status_code.as_bytes());
        hasher.update(gross_amount.as_bytes());
        hasher.update(self.server_key.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    fn verify(&self, notification: &MidtransNotification) -> Result<(), PaymentError> {
        let (Some(status_code), Some(gross_amount), Some(signature)) = (
            notification.status_code.as_deref(),
            notification.gross_amount.as_deref(),
            notification.signature_key.as_deref(),
        ) else {
            return Err(PaymentError::InvalidSignature);
        };

        let expected = self.signature_for(&notification.order_id, status_code, gross_amount);
        if !expected.eq_ignore_ascii_case(signature) {
            warn!(order_number = %notification.order_id, "Midtrans signature mismatch");
            return Err(PaymentError::InvalidSignature);
        }
        Ok(())
    }
}

#[async_trait]
impl PaymentProvider for MidtransProvider {
    fn gateway(&self) -> GatewayType {
        GatewayType::Midtrans
    }

    async fn create_transaction(
        &self,
        request: &CreateTransactionRequest,
    ) -> Result<CreateTransactionResponse, PaymentError> {
        let url = format!(
            "{}/snap/v1/transactions",
            self.base_url.trim_end_matches('/')
        );
        debug!(order_number = %request.order_number, amount = request.amount, "Creating Midtrans transaction");

        let response = self
            .client
            .post(&url)
            .basic_auth(&self.server_key, Some(""))
            .header(reqwest::header::ACCEPT, "application/json")
            .json(&SnapRequest::from(request))
            .send()
            .await
            .map_err(|e| PaymentError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PaymentError::Gateway {
                status: status.as_u16(),
                message: snap_error_message(&body),
            });
        }

        let snap: SnapResponse = response
            .json()
            .await
            .map_err(|e| PaymentError::Http(format!("Failed to parse response: {}", e)))?;

        Ok(CreateTransactionResponse {
            token: snap.token,
            redirect_url: snap.redirect_url,
            transaction_id: None,
        })
    }

    fn parse_webhook(&self, payload: &[u8]) -> Result<PaymentNotification, PaymentError> {
        let notification: MidtransNotification = serde_json::from_slice(payload)
            .map_err(|e| PaymentError::InvalidPayload(e.to_string()))?;

        if notification.order_id.trim().is_empty() {
            return Err(PaymentError::InvalidPayload(
                "order_id is empty".to_string(),
            ));
        }

        if self.verify_signature {
            self.verify(&notification)?;
        }

        let status = map_status(
            &notification.transaction_status,
            notification.fraud_status.as_deref(),
        )?;

        Ok(PaymentNotification {
            order_number: notification.order_id,
            transaction_id: notification.transaction_id,
            status,
            payment_type: notification.payment_type,
            gateway: GatewayType::Midtrans,
            raw_payload: String::from_utf8_lossy(payload).into_owned(),
        })
    }
}

/// Map a Midtrans `transaction_status` (and `fraud_status` for card captures)
/// to a [`PaymentStatus`].
fn map_status(
    transaction_status: &str,
    fraud_status: Option<&str>,
) -> Result<PaymentStatus, PaymentError> {
    match transaction_status {
        "settlement" => Ok(PaymentStatus::Paid),
        "capture" => match fraud_status {
            None | Some("accept") => Ok(PaymentStatus::Paid),
            Some("challenge") => Ok(PaymentStatus::Pending),
            Some("deny") => Ok(PaymentStatus::Failed),
            Some(other) => Err(PaymentError::UnsupportedStatus(format!(
                "capture with fraud_status {}",
                other
            ))),
        },
        "pending" => Ok(PaymentStatus::Pending),
        "deny" | "cancel" | "failure" => Ok(PaymentStatus::Failed),
        "expire" => Ok(PaymentStatus::Expired),
        other => Err(PaymentError::UnsupportedStatus(other.to_string())),
    }
}

fn snap_error_message(body: &str) -> String {
    match serde_json::from_str::<SnapErrorResponse>(body) {
        Ok(err) if !err.error_messages.is_empty() => err.error_messages.join("; "),
        _ => body.chars().take(200).collect(),
    }
}

// Snap API wire types

#[derive(Debug, Serialize)]
struct SnapRequest<'a> {
    transaction_details: TransactionDetails<'a>,
    customer_details: CustomerDetails<'a>,
    item_details: Vec<ItemDetails<'a>>,
    expiry: Expiry,
}

#[derive(Debug, Serialize)]
struct TransactionDetails<'a> {
    order_id: &'a str,
    gross_amount: i64,
}

#[derive(Debug, Serialize)]
struct CustomerDetails<'a> {
    first_name: &'a str,
    email: &'a str,
    phone: &'a str,
}

#[derive(Debug, Serialize)]
struct ItemDetails<'a> {
    id: &'a str,
    name: &'a str,
    price: i64,
    quantity: i64,
}

#[derive(Debug, Serialize)]
struct Expiry {
    unit: &'static str,
    duration: u32,
}

impl<'a> From<&'a CreateTransactionRequest> for SnapRequest<'a> {
    fn from(request: &'a CreateTransactionRequest) -> Self {
        Self {
            transaction_details: TransactionDetails {
                order_id: &request.order_number,
                gross_amount: request.amount,
            },
            customer_details: CustomerDetails {
                first_name: &request.customer.name,
                email: &request.customer.email,
                phone: &request.customer.phone,
            },
            item_details: request
                .items
                .iter()
                .map(|item| ItemDetails {
                    id: &item.id,
                    name: &item.name,
                    price: item.price,
                    quantity: item.quantity,
                })
                .collect(),
            expiry: Expiry {
                unit: "minute",
                duration: request.expiry_minutes,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct SnapResponse {
    token: String,
    redirect_url: String,
}

#[derive(Debug, Deserialize)]
struct SnapErrorResponse {
    #[serde(default)]
    error_messages: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct MidtransNotification {
    order_id: String,
    transaction_status: String,
    #[serde(default)]
    transaction_id: Option<String>,
    #[serde(default)]
    fraud_status: Option<String>,
    #[serde(default)]
    payment_type: Option<String>,
    #[serde(default)]
    status_code: Option<String>,
    #[serde(default)]
    gross_amount: Option<String>,
    #[serde(default)]
    signature_key: Option<String>,
}
