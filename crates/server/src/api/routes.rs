use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::middleware::metrics_middleware;
use super::{handlers, orders, registrations, ticket_types, webhooks};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    let api_routes = Router::new()
        // Health, config and metrics
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        .route("/metrics", get(handlers::get_metrics))
        // Purchase flow
        .route("/registrations", post(registrations::register))
        .route("/orders/{order_number}", get(orders::get_order))
        .route(
            "/webhooks/payment/{gateway}",
            post(webhooks::payment_notification),
        )
        // Inventory administration
        .route(
            "/ticket-types",
            post(ticket_types::create_ticket_type).get(ticket_types::list_ticket_types),
        )
        .route(
            "/ticket-types/{id}",
            get(ticket_types::get_ticket_type)
                .put(ticket_types::update_ticket_type)
                .delete(ticket_types::delete_ticket_type),
        )
        .with_state(state);

    Router::new()
        .nest("/api/v1", api_routes)
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
}
