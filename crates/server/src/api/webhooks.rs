//! Payment gateway webhook handler.
//!
//! Gateways retry until they see a 2xx, so duplicates and notifications for
//! already settled orders are acknowledged with 200 as well.

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use boxoffice_core::{SettlementError, SettlementOutcome};
use serde::Serialize;
use std::sync::Arc;

use super::handlers::{api_error, blocking, ApiError};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct WebhookResponse {
    pub message: String,
    #[serde(flatten)]
    pub outcome: SettlementOutcome,
}

pub async fn payment_notification(
    State(state): State<Arc<AppState>>,
    Path(gateway): Path<String>,
    body: Bytes,
) -> Result<Json<WebhookResponse>, ApiError> {
    let settlement = state.settlement().clone();
    match blocking(move || settlement.handle_webhook(&gateway, &body)).await? {
        Ok(outcome) => Ok(Json(WebhookResponse {
            message: message_for(&outcome),
            outcome,
        })),
        Err(e) => Err(api_error(status_for(&e), e)),
    }
}

fn message_for(outcome: &SettlementOutcome) -> String {
    match outcome {
        SettlementOutcome::Applied { to, .. } => format!("Order marked {}", to),
        SettlementOutcome::MetadataUpdated => "Payment still pending".to_string(),
        SettlementOutcome::Duplicate { status } => {
            format!("Order already {}, notification ignored", status)
        }
    }
}

fn status_for(e: &SettlementError) -> StatusCode {
    match e {
        SettlementError::UnsupportedGateway(_) | SettlementError::Payload(_) => {
            StatusCode::BAD_REQUEST
        }
        SettlementError::OrderNotFound(_) => StatusCode::NOT_FOUND,
        SettlementError::RegistrantNotFound(_)
        | SettlementError::Ledger { .. }
        | SettlementError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use boxoffice_core::PaymentStatus;

    #[test]
    fn test_messages() {
        assert_eq!(
            message_for(&SettlementOutcome::Applied {
                from: PaymentStatus::Pending,
                to: PaymentStatus::Paid
            }),
            "Order marked paid"
        );
        assert_eq!(
            message_for(&SettlementOutcome::Duplicate {
                status: PaymentStatus::Expired
            }),
            "Order already expired, notification ignored"
        );
    }

    #[test]
    fn test_response_flattens_outcome() {
        let response = WebhookResponse {
            message: "Payment still pending".to_string(),
            outcome: SettlementOutcome::MetadataUpdated,
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["message"], "Payment still pending");
        assert_eq!(json["outcome"], "metadata_updated");
    }
}
