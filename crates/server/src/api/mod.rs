pub mod handlers;
pub mod middleware;
pub mod orders;
pub mod registrations;
pub mod routes;
pub mod ticket_types;
pub mod webhooks;

pub use handlers::ErrorResponse;
pub use routes::create_router;
