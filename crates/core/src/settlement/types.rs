use serde::Serialize;
use thiserror::Error;

use crate::inventory::InventoryError;
use crate::order::OrderError;
use crate::payment::{PaymentError, PaymentStatus};
use crate::store::StoreError;

/// What a notification did to its order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SettlementOutcome {
    /// The order left `pending` and stock moved accordingly.
    Applied {
        from: PaymentStatus,
        to: PaymentStatus,
    },
    /// Still pending; only gateway metadata was stored.
    MetadataUpdated,
    /// The order was already terminal. Nothing changed.
    Duplicate { status: PaymentStatus },
}

impl SettlementOutcome {
    /// Label for logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            SettlementOutcome::Applied { to, .. } => to.as_str(),
            SettlementOutcome::MetadataUpdated => "pending",
            SettlementOutcome::Duplicate { .. } => "duplicate",
        }
    }
}

#[derive(Debug, Error)]
pub enum SettlementError {
    #[error("Unsupported payment gateway: {0}")]
    UnsupportedGateway(String),

    #[error("Invalid payment notification: {0}")]
    Payload(#[source] PaymentError),

    #[error("Order not found: {0}")]
    OrderNotFound(String),

    #[error("Registrant for order {0} not found")]
    RegistrantNotFound(String),

    /// Booked stock did not cover the order. Indicates inconsistent data.
    #[error("Ledger inconsistency while settling order {order_number}: {source}")]
    Ledger {
        order_number: String,
        #[source]
        source: InventoryError,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<OrderError> for SettlementError {
    fn from(e: OrderError) -> Self {
        match e {
            OrderError::NotFound(order) => SettlementError::OrderNotFound(order),
            OrderError::RegistrantMissing(order) => SettlementError::RegistrantNotFound(order),
            OrderError::Store(e) => SettlementError::Store(e),
        }
    }
}
