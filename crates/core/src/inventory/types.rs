//! Ticket type records and the inputs that create or change them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::store::StoreError;

/// Stock status derived from the counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TicketStatus {
    /// Units can still be booked.
    Available,
    /// Nothing left to book, but some units are still waiting on payment.
    Bookout,
    /// Every unit is sold.
    Sold,
}

impl TicketStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketStatus::Available => "AVAILABLE",
            TicketStatus::Bookout => "BOOKOUT",
            TicketStatus::Sold => "SOLD",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "AVAILABLE" => Some(TicketStatus::Available),
            "BOOKOUT" => Some(TicketStatus::Bookout),
            "SOLD" => Some(TicketStatus::Sold),
            _ => None,
        }
    }

    /// Status for a given pair of counters.
    ///
    /// Mirrors the CASE expressions the ledger writes, so a freshly created
    /// or resized ticket type gets the same status a ledger mutation would.
    pub fn derive(available: i64, booked: i64) -> Self {
        if available > 0 {
            TicketStatus::Available
        } else if booked > 0 {
            TicketStatus::Bookout
        } else {
            TicketStatus::Sold
        }
    }
}

impl std::fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A purchasable class of ticket with its own stock pool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TicketType {
    pub id: String,
    /// Free-form category (e.g. "GOLD", "EARLY_BIRD").
    pub kind: String,
    pub title: String,
    pub description: Option<String>,
    /// Unit price in minor currency units.
    pub price: i64,
    pub total: i64,
    pub available: i64,
    pub booked: i64,
    pub sold: i64,
    pub status: TicketStatus,
    pub is_presale: bool,
    /// Lower values are listed first.
    pub order_priority: i64,
    pub deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TicketType {
    /// Whether the three counters still add up to the total.
    pub fn counters_balanced(&self) -> bool {
        self.available + self.booked + self.sold == self.total
    }

    /// Units that are booked or sold and therefore cannot be removed.
    pub fn committed(&self) -> i64 {
        self.booked + self.sold
    }
}

/// Input for creating a ticket type.
#[derive(Debug, Clone, Deserialize)]
pub struct NewTicketType {
    pub kind: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: i64,
    pub total: i64,
    #[serde(default)]
    pub is_presale: bool,
    #[serde(default)]
    pub order_priority: i64,
}

impl NewTicketType {
    pub fn new(kind: impl Into<String>, title: impl Into<String>, price: i64, total: i64) -> Self {
        Self {
            kind: kind.into(),
            title: title.into(),
            description: None,
            price,
            total,
            is_presale: false,
            order_priority: 0,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_presale(mut self, is_presale: bool) -> Self {
        self.is_presale = is_presale;
        self
    }

    pub fn with_order_priority(mut self, order_priority: i64) -> Self {
        self.order_priority = order_priority;
        self
    }

    pub(crate) fn validate(&self) -> Result<(), InventoryError> {
        if self.title.trim().is_empty() {
            return Err(InventoryError::Invalid("title cannot be empty".to_string()));
        }
        if self.kind.trim().is_empty() {
            return Err(InventoryError::Invalid("kind cannot be empty".to_string()));
        }
        if self.price < 0 {
            return Err(InventoryError::Invalid("price cannot be negative".to_string()));
        }
        if self.total < 0 {
            return Err(InventoryError::Invalid("total cannot be negative".to_string()));
        }
        Ok(())
    }
}

/// Partial update for a ticket type. `None` leaves a field unchanged.
///
/// Counters are not part of the update; only `total` can be changed and the
/// ledger recomputes `available` from it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TicketTypeUpdate {
    pub kind: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<i64>,
    pub total: Option<i64>,
    pub is_presale: Option<bool>,
    pub order_priority: Option<i64>,
}

impl TicketTypeUpdate {
    pub(crate) fn validate(&self) -> Result<(), InventoryError> {
        if matches!(&self.title, Some(t) if t.trim().is_empty()) {
            return Err(InventoryError::Invalid("title cannot be empty".to_string()));
        }
        if matches!(&self.kind, Some(k) if k.trim().is_empty()) {
            return Err(InventoryError::Invalid("kind cannot be empty".to_string()));
        }
        if matches!(self.price, Some(p) if p < 0) {
            return Err(InventoryError::Invalid("price cannot be negative".to_string()));
        }
        if matches!(self.total, Some(t) if t < 0) {
            return Err(InventoryError::Invalid("total cannot be negative".to_string()));
        }
        Ok(())
    }

    pub(crate) fn has_details(&self) -> bool {
        self.kind.is_some()
            || self.title.is_some()
            || self.description.is_some()
            || self.price.is_some()
            || self.is_presale.is_some()
            || self.order_priority.is_some()
    }
}

/// Filter for listing ticket types.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TicketTypeFilter {
    /// Include soft-deleted ticket types.
    #[serde(default)]
    pub include_deleted: bool,
    pub is_presale: Option<bool>,
    pub kind: Option<String>,
}

impl TicketTypeFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_deleted(mut self) -> Self {
        self.include_deleted = true;
        self
    }

    pub fn with_presale(mut self, is_presale: bool) -> Self {
        self.is_presale = Some(is_presale);
        self
    }

    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }
}

/// Errors from inventory operations and the ticket ledger.
#[derive(Debug, Error)]
pub enum InventoryError {
    #[error("Ticket type not found: {0}")]
    NotFound(String),

    #[error("Invalid ticket type: {0}")]
    Invalid(String),

    #[error("Quantity must be positive, got {0}")]
    InvalidQuantity(i64),

    #[error("Insufficient stock for ticket type {ticket_id}: requested {requested}")]
    InsufficientStock { ticket_id: String, requested: i64 },

    #[error("Insufficient booked stock for ticket type {ticket_id}: requested {requested}")]
    InsufficientBookedStock { ticket_id: String, requested: i64 },

    #[error(
        "Cannot set total of ticket type {ticket_id} to {requested}: {committed} units are booked or sold"
    )]
    TotalBelowCommitted {
        ticket_id: String,
        requested: i64,
        committed: i64,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<rusqlite::Error> for InventoryError {
    fn from(e: rusqlite::Error) -> Self {
        InventoryError::Store(e.into())
    }
}
