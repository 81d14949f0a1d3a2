//! Order status lookup.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use boxoffice_core::{OrderDetails, OrderError};
use std::sync::Arc;

use super::handlers::{api_error, blocking, ApiError};
use crate::state::AppState;

pub async fn get_order(
    State(state): State<Arc<AppState>>,
    Path(order_number): Path<String>,
) -> Result<Json<OrderDetails>, ApiError> {
    let orders = state.orders().clone();
    match blocking(move || orders.find(&order_number)).await? {
        Ok(details) => Ok(Json(details)),
        Err(e @ OrderError::NotFound(_)) => Err(api_error(StatusCode::NOT_FOUND, e)),
        Err(e) => Err(api_error(StatusCode::INTERNAL_SERVER_ERROR, e)),
    }
}
