//! Payment gateways.
//!
//! A [`PaymentProvider`] opens transactions for new registrations and turns
//! the gateway's asynchronous notifications into a [`PaymentNotification`].
//! [`PaymentGateways`] selects the provider by [`GatewayType`].

mod midtrans;
mod provider;
mod registry;
mod types;

pub use midtrans::MidtransProvider;
pub use provider::PaymentProvider;
pub use registry::PaymentGateways;
pub use types::{
    CreateTransactionRequest, CreateTransactionResponse, Customer, GatewayType, LineItem,
    PaymentError, PaymentNotification, PaymentStatus,
};
