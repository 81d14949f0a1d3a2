//! Atomic stock counter mutations.
//!
//! Every operation is a single conditional `UPDATE` whose `WHERE` clause
//! re-checks the precondition when the statement runs. A row that no longer
//! satisfies it is simply not matched, so concurrent callers can never drive
//! a counter negative. The derived `status` is recomputed in the same
//! statement from the pre-update counters.

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, warn};

use super::types::InventoryError;
use crate::metrics::LEDGER_REJECTIONS_TOTAL;
use crate::store::{format_timestamp, UnitOfWork};

impl UnitOfWork {
    /// Ticket ledger scoped to this unit of work.
    pub fn ledger(&self) -> TicketLedger<'_> {
        TicketLedger { conn: self.conn() }
    }
}

pub struct TicketLedger<'a> {
    conn: &'a Connection,
}

impl TicketLedger<'_> {
    /// Move `qty` units from available to booked.
    ///
    /// Fails with [`InventoryError::InsufficientStock`] when fewer than `qty`
    /// units are available or the ticket type is unknown or soft-deleted.
    pub fn book_stock(&self, ticket_id: &str, qty: i64) -> Result<(), InventoryError> {
        check_quantity(qty)?;

        let changed = self.conn.execute(
            "UPDATE ticket_types
             SET available = available - ?2,
                 booked = booked + ?2,
                 status = CASE WHEN available - ?2 <= 0 THEN 'BOOKOUT' ELSE 'AVAILABLE' END,
                 updated_at = ?3
             WHERE id = ?1 AND deleted = 0 AND available >= ?2",
            params![ticket_id, qty, now()],
        )?;

        if changed == 0 {
            reject("book_stock", ticket_id, qty);
            return Err(InventoryError::InsufficientStock {
                ticket_id: ticket_id.to_string(),
                requested: qty,
            });
        }

        debug!(ticket_id = %ticket_id, qty, "Booked stock");
        Ok(())
    }

    /// Move `qty` units from booked to sold.
    pub fn confirm_sold(&self, ticket_id: &str, qty: i64) -> Result<(), InventoryError> {
        check_quantity(qty)?;

        let changed = self.conn.execute(
            "UPDATE ticket_types
             SET booked = booked - ?2,
                 sold = sold + ?2,
                 status = CASE
                     WHEN available = 0 AND booked - ?2 <= 0 THEN 'SOLD'
                     WHEN available = 0 THEN 'BOOKOUT'
                     ELSE 'AVAILABLE'
                 END,
                 updated_at = ?3
             WHERE id = ?1 AND booked >= ?2",
            params![ticket_id, qty, now()],
        )?;

        if changed == 0 {
            reject("confirm_sold", ticket_id, qty);
            return Err(InventoryError::InsufficientBookedStock {
                ticket_id: ticket_id.to_string(),
                requested: qty,
            });
        }

        debug!(ticket_id = %ticket_id, qty, "Confirmed sold stock");
        Ok(())
    }

    /// Return `qty` booked units to available.
    pub fn release_booked(&self, ticket_id: &str, qty: i64) -> Result<(), InventoryError> {
        check_quantity(qty)?;

        let changed = self.conn.execute(
            "UPDATE ticket_types
             SET available = available + ?2,
                 booked = booked - ?2,
                 status = 'AVAILABLE',
                 updated_at = ?3
             WHERE id = ?1 AND booked >= ?2",
            params![ticket_id, qty, now()],
        )?;

        if changed == 0 {
            reject("release_booked", ticket_id, qty);
            return Err(InventoryError::InsufficientBookedStock {
                ticket_id: ticket_id.to_string(),
                requested: qty,
            });
        }

        debug!(ticket_id = %ticket_id, qty, "Released booked stock");
        Ok(())
    }

    /// Change the total, recomputing available from what is booked and sold.
    ///
    /// Fails with [`InventoryError::TotalBelowCommitted`] when `new_total` is
    /// smaller than `booked + sold`.
    pub fn adjust_total(&self, ticket_id: &str, new_total: i64) -> Result<(), InventoryError> {
        if new_total < 0 {
            return Err(InventoryError::Invalid(
                "total cannot be negative".to_string(),
            ));
        }

        let changed = self.conn.execute(
            "UPDATE ticket_types
             SET total = ?2,
                 available = ?2 - booked - sold,
                 status = CASE
                     WHEN ?2 - booked - sold > 0 THEN 'AVAILABLE'
                     WHEN booked > 0 THEN 'BOOKOUT'
                     ELSE 'SOLD'
                 END,
                 updated_at = ?3
             WHERE id = ?1 AND ?2 >= booked + sold",
            params![ticket_id, new_total, now()],
        )?;

        if changed > 0 {
            debug!(ticket_id = %ticket_id, new_total, "Adjusted ticket total");
            return Ok(());
        }

        // Only reached on failure, to pick the right error.
        let committed: Option<i64> = self
            .conn
            .query_row(
                "SELECT booked + sold FROM ticket_types WHERE id = ?1",
                params![ticket_id],
                |row| row.get(0),
            )
            .optional()?;

        match committed {
            None => Err(InventoryError::NotFound(ticket_id.to_string())),
            Some(committed) => {
                reject("adjust_total", ticket_id, new_total);
                Err(InventoryError::TotalBelowCommitted {
                    ticket_id: ticket_id.to_string(),
                    requested: new_total,
                    committed,
                })
            }
        }
    }
}

fn check_quantity(qty: i64) -> Result<(), InventoryError> {
    if qty <= 0 {
        return Err(InventoryError::InvalidQuantity(qty));
    }
    Ok(())
}

fn reject(operation: &str, ticket_id: &str, qty: i64) {
    warn!(operation, ticket_id = %ticket_id, qty, "Ledger precondition not met");
    LEDGER_REJECTIONS_TOTAL
        .with_label_values(&[operation])
        .inc();
}

fn now() -> String {
    format_timestamp(&Utc::now())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::{NewTicketType, TicketStatus, TicketType};
    use crate::store::Database;

    fn setup(total: i64) -> (tempfile::TempDir, Database, String) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open(&dir.path().join("ledger.db")).unwrap();
        let uow = db.begin().unwrap();
        let ticket = uow
            .tickets()
            .insert(&NewTicketType::new("GOLD", "Gold", 100_000, total))
            .unwrap();
        uow.commit().unwrap();
        (dir, db, ticket.id)
    }

    fn fetch(uow: &UnitOfWork, id: &str) -> TicketType {
        uow.tickets().get(id).unwrap().unwrap()
    }

    fn counters(ticket: &TicketType) -> (i64, i64, i64) {
        (ticket.available, ticket.booked, ticket.sold)
    }

    #[test]
    fn test_book_stock_moves_available_to_booked() {
        let (_dir, db, id) = setup(10);
        let uow = db.begin().unwrap();
        uow.ledger().book_stock(&id, 3).unwrap();

        let ticket = fetch(&uow, &id);
        assert_eq!(counters(&ticket), (7, 3, 0));
        assert_eq!(ticket.status, TicketStatus::Available);
        assert!(ticket.counters_balanced());
    }

    #[test]
    fn test_book_last_unit_sets_bookout() {
        let (_dir, db, id) = setup(2);
        let uow = db.begin().unwrap();
        uow.ledger().book_stock(&id, 2).unwrap();

        let ticket = fetch(&uow, &id);
        assert_eq!(counters(&ticket), (0, 2, 0));
        assert_eq!(ticket.status, TicketStatus::Bookout);
    }

    #[test]
    fn test_book_more_than_available_fails_without_change() {
        let (_dir, db, id) = setup(2);
        let uow = db.begin().unwrap();
        let result = uow.ledger().book_stock(&id, 3);
        assert!(matches!(
            result,
            Err(InventoryError::InsufficientStock { requested: 3, .. })
        ));
        assert_eq!(counters(&fetch(&uow, &id)), (2, 0, 0));
    }

    #[test]
    fn test_book_unknown_ticket_is_insufficient_stock() {
        let (_dir, db, _id) = setup(2);
        let uow = db.begin().unwrap();
        assert!(matches!(
            uow.ledger().book_stock("missing", 1),
            Err(InventoryError::InsufficientStock { .. })
        ));
    }

    #[test]
    fn test_book_deleted_ticket_fails() {
        let (_dir, db, id) = setup(5);
        let uow = db.begin().unwrap();
        uow.tickets().soft_delete(&id).unwrap();
        assert!(matches!(
            uow.ledger().book_stock(&id, 1),
            Err(InventoryError::InsufficientStock { .. })
        ));
    }

    #[test]
    fn test_non_positive_quantity_rejected() {
        let (_dir, db, id) = setup(5);
        let uow = db.begin().unwrap();
        let ledger = uow.ledger();
        assert!(matches!(
            ledger.book_stock(&id, 0),
            Err(InventoryError::InvalidQuantity(0))
        ));
        assert!(matches!(
            ledger.confirm_sold(&id, -1),
            Err(InventoryError::InvalidQuantity(-1))
        ));
        assert!(matches!(
            ledger.release_booked(&id, 0),
            Err(InventoryError::InvalidQuantity(0))
        ));
    }

    #[test]
    fn test_confirm_sold_keeps_available_status_when_stock_remains() {
        let (_dir, db, id) = setup(10);
        let uow = db.begin().unwrap();
        let ledger = uow.ledger();
        ledger.book_stock(&id, 3).unwrap();
        ledger.confirm_sold(&id, 3).unwrap();

        let ticket = fetch(&uow, &id);
        assert_eq!(counters(&ticket), (7, 0, 3));
        assert_eq!(ticket.status, TicketStatus::Available);
    }

    #[test]
    fn test_confirm_sold_statuses_when_sold_out() {
        let (_dir, db, id) = setup(3);
        let uow = db.begin().unwrap();
        let ledger = uow.ledger();
        ledger.book_stock(&id, 2).unwrap();
        ledger.book_stock(&id, 1).unwrap();

        ledger.confirm_sold(&id, 2).unwrap();
        let ticket = fetch(&uow, &id);
        assert_eq!(counters(&ticket), (0, 1, 2));
        assert_eq!(ticket.status, TicketStatus::Bookout);

        ledger.confirm_sold(&id, 1).unwrap();
        let ticket = fetch(&uow, &id);
        assert_eq!(counters(&ticket), (0, 0, 3));
        assert_eq!(ticket.status, TicketStatus::Sold);
    }

    #[test]
    fn test_confirm_more_than_booked_fails() {
        let (_dir, db, id) = setup(5);
        let uow = db.begin().unwrap();
        let ledger = uow.ledger();
        ledger.book_stock(&id, 1).unwrap();
        assert!(matches!(
            ledger.confirm_sold(&id, 2),
            Err(InventoryError::InsufficientBookedStock { requested: 2, .. })
        ));
        assert_eq!(counters(&fetch(&uow, &id)), (4, 1, 0));
    }

    #[test]
    fn test_release_restores_available() {
        let (_dir, db, id) = setup(1);
        let uow = db.begin().unwrap();
        let ledger = uow.ledger();
        ledger.book_stock(&id, 1).unwrap();
        assert_eq!(fetch(&uow, &id).status, TicketStatus::Bookout);

        ledger.release_booked(&id, 1).unwrap();
        let ticket = fetch(&uow, &id);
        assert_eq!(counters(&ticket), (1, 0, 0));
        assert_eq!(ticket.status, TicketStatus::Available);
    }

    #[test]
    fn test_release_more_than_booked_fails() {
        let (_dir, db, id) = setup(5);
        let uow = db.begin().unwrap();
        assert!(matches!(
            uow.ledger().release_booked(&id, 1),
            Err(InventoryError::InsufficientBookedStock { .. })
        ));
    }

    #[test]
    fn test_existing_bookings_settle_after_soft_delete() {
        let (_dir, db, id) = setup(4);
        let uow = db.begin().unwrap();
        let ledger = uow.ledger();
        ledger.book_stock(&id, 2).unwrap();
        uow.tickets().soft_delete(&id).unwrap();

        ledger.confirm_sold(&id, 1).unwrap();
        ledger.release_booked(&id, 1).unwrap();
        assert_eq!(counters(&fetch(&uow, &id)), (3, 0, 1));
    }

    #[test]
    fn test_adjust_total() {
        let (_dir, db, id) = setup(5);
        let uow = db.begin().unwrap();
        let ledger = uow.ledger();
        ledger.book_stock(&id, 2).unwrap();
        ledger.confirm_sold(&id, 1).unwrap();

        ledger.adjust_total(&id, 8).unwrap();
        let ticket = fetch(&uow, &id);
        assert_eq!((ticket.total, ticket.available, ticket.booked, ticket.sold), (8, 6, 1, 1));
        assert_eq!(ticket.status, TicketStatus::Available);

        ledger.adjust_total(&id, 2).unwrap();
        let ticket = fetch(&uow, &id);
        assert_eq!(counters(&ticket), (0, 1, 1));
        assert_eq!(ticket.status, TicketStatus::Bookout);

        let result = ledger.adjust_total(&id, 1);
        assert!(matches!(
            result,
            Err(InventoryError::TotalBelowCommitted {
                requested: 1,
                committed: 2,
                ..
            })
        ));
    }

    #[test]
    fn test_adjust_total_unknown_ticket() {
        let (_dir, db, _id) = setup(5);
        let uow = db.begin().unwrap();
        assert!(matches!(
            uow.ledger().adjust_total("missing", 3),
            Err(InventoryError::NotFound(_))
        ));
    }
}
