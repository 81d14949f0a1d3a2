//! Settlement: reconciling asynchronous payment notifications with orders.

mod types;
mod workflow;

pub use types::{SettlementError, SettlementOutcome};
pub use workflow::SettlementService;
