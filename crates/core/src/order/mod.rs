//! Orders: one per registration, carrying the payment state.

mod repository;
mod service;
mod types;

pub use repository::OrderRepository;
pub use service::OrderService;
pub use types::{Order, OrderDetails, OrderError};
