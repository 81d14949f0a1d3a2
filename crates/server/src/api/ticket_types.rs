//! Ticket type administration handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use boxoffice_core::{
    InventoryError, NewTicketType, TicketType, TicketTypeFilter, TicketTypeUpdate,
};
use serde::Deserialize;
use std::sync::Arc;

use super::handlers::{api_error, blocking, ApiError};
use crate::state::AppState;

/// Query parameters for listing ticket types
#[derive(Debug, Deserialize)]
pub struct ListTicketTypesParams {
    /// Include soft-deleted ticket types
    pub include_deleted: Option<bool>,
    pub presale: Option<bool>,
    pub kind: Option<String>,
}

impl From<ListTicketTypesParams> for TicketTypeFilter {
    fn from(params: ListTicketTypesParams) -> Self {
        let mut filter = TicketTypeFilter::new();
        if params.include_deleted.unwrap_or(false) {
            filter = filter.with_deleted();
        }
        if let Some(presale) = params.presale {
            filter = filter.with_presale(presale);
        }
        if let Some(kind) = params.kind {
            filter = filter.with_kind(kind);
        }
        filter
    }
}

pub async fn create_ticket_type(
    State(state): State<Arc<AppState>>,
    Json(body): Json<NewTicketType>,
) -> Result<(StatusCode, Json<TicketType>), ApiError> {
    let inventory = state.inventory().clone();
    blocking(move || inventory.create(body))
        .await?
        .map(|ticket| (StatusCode::CREATED, Json(ticket)))
        .map_err(into_api_error)
}

pub async fn list_ticket_types(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListTicketTypesParams>,
) -> Result<Json<Vec<TicketType>>, ApiError> {
    let inventory = state.inventory().clone();
    let filter = TicketTypeFilter::from(params);
    blocking(move || inventory.list(&filter))
        .await?
        .map(Json)
        .map_err(into_api_error)
}

pub async fn get_ticket_type(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<TicketType>, ApiError> {
    let inventory = state.inventory().clone();
    blocking(move || inventory.get(&id))
        .await?
        .map(Json)
        .map_err(into_api_error)
}

pub async fn update_ticket_type(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<TicketTypeUpdate>,
) -> Result<Json<TicketType>, ApiError> {
    let inventory = state.inventory().clone();
    blocking(move || inventory.update(&id, body))
        .await?
        .map(Json)
        .map_err(into_api_error)
}

/// Soft delete: the type stops selling, existing orders still settle.
pub async fn delete_ticket_type(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<TicketType>, ApiError> {
    let inventory = state.inventory().clone();
    blocking(move || inventory.soft_delete(&id))
        .await?
        .map(Json)
        .map_err(into_api_error)
}

fn into_api_error(e: InventoryError) -> ApiError {
    let status = match &e {
        InventoryError::NotFound(_) => StatusCode::NOT_FOUND,
        InventoryError::Invalid(_) | InventoryError::InvalidQuantity(_) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        InventoryError::TotalBelowCommitted { .. }
        | InventoryError::InsufficientStock { .. }
        | InventoryError::InsufficientBookedStock { .. } => StatusCode::CONFLICT,
        InventoryError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    api_error(status, e)
}
