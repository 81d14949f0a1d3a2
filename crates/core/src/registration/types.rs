use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::inventory::InventoryError;
use crate::order::OrderError;
use crate::payment::{PaymentError, PaymentStatus};
use crate::store::StoreError;

/// The lead buyer as submitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistrantData {
    pub ticket_id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    #[serde(default)]
    pub gender: Option<String>,
    /// `YYYY-MM-DD`
    #[serde(default)]
    pub birthdate: Option<String>,
}

/// An additional ticket holder as submitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendeeData {
    pub ticket_id: String,
    pub name: String,
    #[serde(default)]
    pub gender: Option<String>,
    /// `YYYY-MM-DD`
    #[serde(default)]
    pub birthdate: Option<String>,
}

/// A purchase request: one registrant plus optional attendees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub registrant: RegistrantData,
    #[serde(default)]
    pub attendees: Vec<AttendeeData>,
}

impl RegisterRequest {
    /// Ticket units this request needs.
    pub fn ticket_count(&self) -> usize {
        1 + self.attendees.len()
    }

    /// Every participant's ticket type, registrant first.
    pub fn ticket_ids(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.registrant.ticket_id.as_str())
            .chain(self.attendees.iter().map(|a| a.ticket_id.as_str()))
    }
}

/// Requested units per ticket type, ordered by ticket id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TicketDemand(BTreeMap<String, i64>);

impl TicketDemand {
    pub fn from_ticket_ids<'a>(ids: impl IntoIterator<Item = &'a str>) -> Self {
        let mut demand = BTreeMap::new();
        for id in ids {
            *demand.entry(id.to_string()).or_insert(0) += 1;
        }
        Self(demand)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, i64)> {
        self.0.iter().map(|(id, qty)| (id.as_str(), *qty))
    }

    pub fn ticket_ids(&self) -> Vec<&str> {
        self.0.keys().map(String::as_str).collect()
    }

    pub fn total_units(&self) -> i64 {
        self.0.values().sum()
    }
}

/// Stored lead buyer. Only `status` changes after creation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Registrant {
    pub id: String,
    pub unique_code: String,
    pub ticket_id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub gender: Option<String>,
    pub birthdate: Option<NaiveDate>,
    pub total_cost: i64,
    pub total_tickets: i64,
    pub status: PaymentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Stored additional ticket holder.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Attendee {
    pub id: String,
    pub registrant_id: String,
    pub ticket_id: String,
    pub name: String,
    pub gender: Option<String>,
    pub birthdate: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

/// Result of a successful registration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub order_id: String,
    pub order_number: String,
    pub amount: i64,
    pub currency: String,
    pub payment_status: PaymentStatus,
    pub payment_token: String,
    pub redirect_url: String,
    pub expires_at: DateTime<Utc>,
    pub registrant_id: String,
    pub unique_code: String,
}

#[derive(Debug, Error)]
pub enum RegistrationError {
    #[error("Too many tickets: requested {requested}, at most {max} per registration")]
    TooManyTickets { requested: usize, max: usize },

    #[error("Unknown ticket type: {0}")]
    UnknownTicket(String),

    #[error("Tickets sold out for ticket type {ticket_id}")]
    InsufficientStock { ticket_id: String, requested: i64 },

    #[error("Invalid registration: {0}")]
    Validation(String),

    #[error("Payment gateway error: {0}")]
    Gateway(#[from] PaymentError),

    #[error("Could not generate a unique code after {0} attempts")]
    CodeGeneration(usize),

    #[error("Inventory error: {0}")]
    Inventory(InventoryError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<InventoryError> for RegistrationError {
    fn from(e: InventoryError) -> Self {
        match e {
            InventoryError::InsufficientStock {
                ticket_id,
                requested,
            } => RegistrationError::InsufficientStock {
                ticket_id,
                requested,
            },
            InventoryError::Store(e) => RegistrationError::Store(e),
            other => RegistrationError::Inventory(other),
        }
    }
}

impl From<OrderError> for RegistrationError {
    fn from(e: OrderError) -> Self {
        match e {
            OrderError::Store(e) => RegistrationError::Store(e),
            other => RegistrationError::Store(StoreError::Database(other.to_string())),
        }
    }
}

impl From<rusqlite::Error> for RegistrationError {
    fn from(e: rusqlite::Error) -> Self {
        RegistrationError::Store(e.into())
    }
}
