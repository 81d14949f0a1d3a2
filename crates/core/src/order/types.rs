use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::payment::{GatewayType, PaymentStatus};
use crate::registration::{Attendee, Registrant};
use crate::store::StoreError;

/// One purchase transaction.
///
/// Created `pending` at registration; only settlement changes it afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Order {
    pub id: String,
    pub registrant_id: String,
    pub order_number: String,
    /// Total in minor currency units.
    pub amount: i64,
    pub currency: String,
    pub payment_gateway: GatewayType,
    pub payment_method: Option<String>,
    pub payment_status: PaymentStatus,
    pub payment_token: Option<String>,
    pub payment_url: Option<String>,
    pub payment_transaction_id: Option<String>,
    /// Last raw gateway notification.
    pub payment_metadata: Option<String>,
    pub payment_time: Option<DateTime<Utc>>,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An order with the people it pays for.
#[derive(Debug, Clone, Serialize)]
pub struct OrderDetails {
    pub order: Order,
    pub registrant: Registrant,
    pub attendees: Vec<Attendee>,
}

#[derive(Debug, Error)]
pub enum OrderError {
    #[error("Order not found: {0}")]
    NotFound(String),

    #[error("Registrant not found for order {0}")]
    RegistrantMissing(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<rusqlite::Error> for OrderError {
    fn from(e: rusqlite::Error) -> Self {
        OrderError::Store(e.into())
    }
}
