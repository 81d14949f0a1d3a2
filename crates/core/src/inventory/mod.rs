//! Ticket inventory: ticket types, their stock counters, and the ledger that
//! mutates them.

mod ledger;
mod repository;
mod service;
mod types;

pub use ledger::TicketLedger;
pub use repository::TicketRepository;
pub use service::InventoryService;
pub use types::{
    InventoryError, NewTicketType, TicketStatus, TicketType, TicketTypeFilter, TicketTypeUpdate,
};
