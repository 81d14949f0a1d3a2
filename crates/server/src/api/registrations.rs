//! Registration API handler.

use axum::{extract::State, http::StatusCode, Json};
use boxoffice_core::{PaymentError, RegisterRequest, RegisterResponse, RegistrationError};
use std::sync::Arc;

use super::handlers::{api_error, ApiError};
use crate::state::AppState;

/// Book tickets for a registrant and attendees and open a payment.
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), ApiError> {
    match state.registration().register(body).await {
        Ok(response) => Ok((StatusCode::CREATED, Json(response))),
        Err(e) => Err(api_error(status_for(&e), e)),
    }
}

fn status_for(e: &RegistrationError) -> StatusCode {
    match e {
        RegistrationError::TooManyTickets { .. } | RegistrationError::Validation(_) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        RegistrationError::UnknownTicket(_) => StatusCode::NOT_FOUND,
        RegistrationError::InsufficientStock { .. } => StatusCode::CONFLICT,
        RegistrationError::Gateway(PaymentError::Timeout(_)) => StatusCode::GATEWAY_TIMEOUT,
        RegistrationError::Gateway(_) => StatusCode::BAD_GATEWAY,
        RegistrationError::CodeGeneration(_)
        | RegistrationError::Inventory(_)
        | RegistrationError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            status_for(&RegistrationError::TooManyTickets {
                requested: 5,
                max: 4
            }),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status_for(&RegistrationError::InsufficientStock {
                ticket_id: "gold".to_string(),
                requested: 1
            }),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_for(&RegistrationError::Gateway(PaymentError::NotConfigured(
                "midtrans".to_string()
            ))),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status_for(&RegistrationError::Gateway(PaymentError::Timeout(
                Duration::from_secs(30)
            ))),
            StatusCode::GATEWAY_TIMEOUT
        );
    }
}
