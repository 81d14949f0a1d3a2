use tracing::info;

use super::types::{InventoryError, NewTicketType, TicketType, TicketTypeFilter, TicketTypeUpdate};
use crate::store::Database;

/// Ticket type administration. Each call runs in its own unit of work.
#[derive(Debug, Clone)]
pub struct InventoryService {
    db: Database,
}

impl InventoryService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub fn create(&self, new: NewTicketType) -> Result<TicketType, InventoryError> {
        let uow = self.db.begin()?;
        let ticket = uow.tickets().insert(&new)?;
        uow.commit()?;

        info!(ticket_id = %ticket.id, title = %ticket.title, total = ticket.total, "Created ticket type");
        Ok(ticket)
    }

    pub fn get(&self, id: &str) -> Result<TicketType, InventoryError> {
        let uow = self.db.read()?;
        uow.tickets()
            .get(id)?
            .ok_or_else(|| InventoryError::NotFound(id.to_string()))
    }

    pub fn list(&self, filter: &TicketTypeFilter) -> Result<Vec<TicketType>, InventoryError> {
        let uow = self.db.read()?;
        uow.tickets().list(filter)
    }

    /// Update descriptive fields and, optionally, the total.
    ///
    /// Both parts apply together or not at all.
    pub fn update(&self, id: &str, update: TicketTypeUpdate) -> Result<TicketType, InventoryError> {
        update.validate()?;

        let uow = self.db.begin()?;
        if uow.tickets().get(id)?.is_none() {
            return Err(InventoryError::NotFound(id.to_string()));
        }

        if update.has_details() {
            uow.tickets().update_details(id, &update)?;
        }
        if let Some(total) = update.total {
            uow.ledger().adjust_total(id, total)?;
        }

        let ticket = uow
            .tickets()
            .get(id)?
            .ok_or_else(|| InventoryError::NotFound(id.to_string()))?;
        uow.commit()?;

        info!(ticket_id = %id, total = ticket.total, available = ticket.available, "Updated ticket type");
        Ok(ticket)
    }

    /// Exclude a ticket type from future sales. Pending bookings still settle.
    pub fn soft_delete(&self, id: &str) -> Result<TicketType, InventoryError> {
        let uow = self.db.begin()?;
        if !uow.tickets().soft_delete(id)? {
            return Err(InventoryError::NotFound(id.to_string()));
        }
        let ticket = uow
            .tickets()
            .get(id)?
            .ok_or_else(|| InventoryError::NotFound(id.to_string()))?;
        uow.commit()?;

        info!(ticket_id = %id, "Soft-deleted ticket type");
        Ok(ticket)
    }
}
