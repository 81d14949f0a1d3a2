//! Gateway-neutral payment types.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Supported payment gateway brands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GatewayType {
    Midtrans,
}

impl GatewayType {
    pub fn as_str(&self) -> &'static str {
        match self {
            GatewayType::Midtrans => "midtrans",
        }
    }
}

impl fmt::Display for GatewayType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GatewayType {
    type Err = PaymentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "midtrans" => Ok(GatewayType::Midtrans),
            _ => Err(PaymentError::UnsupportedGateway(s.to_string())),
        }
    }
}

/// Payment status of an order, as normalized from any gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Failed,
    Expired,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Expired => "expired",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(PaymentStatus::Pending),
            "paid" => Some(PaymentStatus::Paid),
            "failed" => Some(PaymentStatus::Failed),
            "expired" => Some(PaymentStatus::Expired),
            _ => None,
        }
    }

    /// Terminal statuses never change again.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, PaymentStatus::Pending)
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Buyer details passed to the gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub name: String,
    pub email: String,
    pub phone: String,
}

/// One line of the transaction breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub id: String,
    pub name: String,
    /// Unit price in minor currency units.
    pub price: i64,
    pub quantity: i64,
}

/// Request to open a payment transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateTransactionRequest {
    pub order_number: String,
    pub amount: i64,
    pub customer: Customer,
    pub items: Vec<LineItem>,
    pub expiry_minutes: u32,
}

/// What the gateway hands back for a new transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateTransactionResponse {
    /// Gateway token, e.g. a Snap token.
    pub token: String,
    /// Hosted payment page for the buyer.
    pub redirect_url: String,
    /// Present when the gateway assigns a transaction id up front.
    #[serde(default)]
    pub transaction_id: Option<String>,
}

/// A gateway notification normalized to [`PaymentStatus`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentNotification {
    pub order_number: String,
    pub transaction_id: Option<String>,
    pub status: PaymentStatus,
    /// e.g. "bank_transfer", "gopay", "credit_card".
    pub payment_type: Option<String>,
    pub gateway: GatewayType,
    /// The notification body exactly as received.
    pub raw_payload: String,
}

/// Errors from payment gateways.
#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Gateway returned {status}: {message}")]
    Gateway { status: u16, message: String },

    #[error("Invalid notification payload: {0}")]
    InvalidPayload(String),

    #[error("Notification signature does not match")]
    InvalidSignature,

    #[error("Unsupported transaction status: {0}")]
    UnsupportedStatus(String),

    #[error("Unsupported payment gateway: {0}")]
    UnsupportedGateway(String),

    #[error("Payment gateway not configured: {0}")]
    NotConfigured(String),

    #[error("Payment gateway did not answer within {0:?}")]
    Timeout(std::time::Duration),
}
