//! Registrant and attendee rows.

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::types::{Attendee, Registrant};
use crate::payment::PaymentStatus;
use crate::store::{
    corrupt_column, format_date, format_timestamp, optional_date_column, timestamp_column,
    StoreError, UnitOfWork,
};

const REGISTRANT_COLUMNS: &str = "id, unique_code, ticket_id, name, email, phone, gender, \
                                  birthdate, total_cost, total_tickets, status, created_at, \
                                  updated_at";

const ATTENDEE_COLUMNS: &str = "id, registrant_id, ticket_id, name, gender, birthdate, created_at";

impl UnitOfWork {
    /// Registrant repository scoped to this unit of work.
    pub fn registrants(&self) -> RegistrantRepository<'_> {
        RegistrantRepository { conn: self.conn() }
    }
}

pub struct RegistrantRepository<'a> {
    conn: &'a Connection,
}

impl RegistrantRepository<'_> {
    pub fn insert(&self, registrant: &Registrant) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT INTO registrants (id, unique_code, ticket_id, name, email, phone, gender, birthdate, total_cost, total_tickets, status, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
            params![
                registrant.id,
                registrant.unique_code,
                registrant.ticket_id,
                registrant.name,
                registrant.email,
                registrant.phone,
                registrant.gender,
                registrant.birthdate.as_ref().map(format_date),
                registrant.total_cost,
                registrant.total_tickets,
                registrant.status.as_str(),
                format_timestamp(&registrant.created_at),
                format_timestamp(&registrant.updated_at),
            ],
        )?;
        Ok(())
    }

    pub fn insert_attendee(&self, attendee: &Attendee) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT INTO attendees (id, registrant_id, ticket_id, name, gender, birthdate, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                attendee.id,
                attendee.registrant_id,
                attendee.ticket_id,
                attendee.name,
                attendee.gender,
                attendee.birthdate.as_ref().map(format_date),
                format_timestamp(&attendee.created_at),
            ],
        )?;
        Ok(())
    }

    pub fn get(&self, id: &str) -> Result<Option<Registrant>, StoreError> {
        let sql = format!(
            "SELECT {} FROM registrants WHERE id = ?1",
            REGISTRANT_COLUMNS
        );
        let registrant = self
            .conn
            .query_row(&sql, params![id], row_to_registrant)
            .optional()?;
        Ok(registrant)
    }

    /// Attendees of a registrant, in the order they were added.
    pub fn attendees(&self, registrant_id: &str) -> Result<Vec<Attendee>, StoreError> {
        let sql = format!(
            "SELECT {} FROM attendees WHERE registrant_id = ?1 ORDER BY rowid",
            ATTENDEE_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![registrant_id], row_to_attendee)?;

        let mut attendees = Vec::new();
        for row in rows {
            attendees.push(row?);
        }
        Ok(attendees)
    }

    pub fn unique_code_exists(&self, unique_code: &str) -> Result<bool, StoreError> {
        let exists = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM registrants WHERE unique_code = ?1)",
            params![unique_code],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    /// Mirror the order's payment status onto the registrant.
    pub fn update_status(&self, id: &str, status: PaymentStatus) -> Result<bool, StoreError> {
        let changed = self.conn.execute(
            "UPDATE registrants SET status = ?1, updated_at = ?2 WHERE id = ?3",
            params![status.as_str(), format_timestamp(&Utc::now()), id],
        )?;
        Ok(changed > 0)
    }
}

fn row_to_registrant(row: &Row<'_>) -> rusqlite::Result<Registrant> {
    let status_str: String = row.get(10)?;
    let status = PaymentStatus::parse(&status_str)
        .ok_or_else(|| corrupt_column(10, format!("unknown registrant status {:?}", status_str)))?;

    Ok(Registrant {
        id: row.get(0)?,
        unique_code: row.get(1)?,
        ticket_id: row.get(2)?,
        name: row.get(3)?,
        email: row.get(4)?,
        phone: row.get(5)?,
        gender: row.get(6)?,
        birthdate: optional_date_column(row, 7)?,
        total_cost: row.get(8)?,
        total_tickets: row.get(9)?,
        status,
        created_at: timestamp_column(row, 11)?,
        updated_at: timestamp_column(row, 12)?,
    })
}

fn row_to_attendee(row: &Row<'_>) -> rusqlite::Result<Attendee> {
    Ok(Attendee {
        id: row.get(0)?,
        registrant_id: row.get(1)?,
        ticket_id: row.get(2)?,
        name: row.get(3)?,
        gender: row.get(4)?,
        birthdate: optional_date_column(row, 5)?,
        created_at: timestamp_column(row, 6)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::NewTicketType;
    use crate::store::Database;
    use chrono::NaiveDate;

    fn setup() -> (tempfile::TempDir, Database, String) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open(&dir.path().join("registrants.db")).unwrap();
        let uow = db.begin().unwrap();
        let ticket = uow
            .tickets()
            .insert(&NewTicketType::new("GOLD", "Gold", 100, 10))
            .unwrap();
        uow.commit().unwrap();
        (dir, db, ticket.id)
    }

    fn registrant(ticket_id: &str) -> Registrant {
        let now = Utc::now();
        Registrant {
            id: "reg-1".to_string(),
            unique_code: "JMF-2026-ABCD1234".to_string(),
            ticket_id: ticket_id.to_string(),
            name: "Ayu".to_string(),
            email: "ayu@example.com".to_string(),
            phone: "0812".to_string(),
            gender: Some("F".to_string()),
            birthdate: NaiveDate::from_ymd_opt(1995, 4, 12),
            total_cost: 200,
            total_tickets: 2,
            status: PaymentStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_insert_and_get_with_attendees() {
        let (_dir, db, ticket_id) = setup();
        let uow = db.begin().unwrap();
        let repo = uow.registrants();
        let reg = registrant(&ticket_id);
        repo.insert(&reg).unwrap();

        for (i, name) in ["Budi", "Citra"].iter().enumerate() {
            repo.insert_attendee(&Attendee {
                id: format!("att-{}", i),
                registrant_id: reg.id.clone(),
                ticket_id: ticket_id.clone(),
                name: name.to_string(),
                gender: None,
                birthdate: None,
                created_at: Utc::now(),
            })
            .unwrap();
        }
        uow.commit().unwrap();

        let uow = db.read().unwrap();
        let repo = uow.registrants();
        let fetched = repo.get("reg-1").unwrap().unwrap();
        assert_eq!(fetched.unique_code, reg.unique_code);
        assert_eq!(fetched.birthdate, reg.birthdate);
        assert_eq!(fetched.status, PaymentStatus::Pending);

        let names: Vec<_> = repo
            .attendees("reg-1")
            .unwrap()
            .into_iter()
            .map(|a| a.name)
            .collect();
        assert_eq!(names, vec!["Budi", "Citra"]);
    }

    #[test]
    fn test_unique_code_exists_and_update_status() {
        let (_dir, db, ticket_id) = setup();
        let uow = db.begin().unwrap();
        let repo = uow.registrants();
        repo.insert(&registrant(&ticket_id)).unwrap();

        assert!(repo.unique_code_exists("JMF-2026-ABCD1234").unwrap());
        assert!(!repo.unique_code_exists("JMF-2026-00000000").unwrap());

        assert!(repo.update_status("reg-1", PaymentStatus::Paid).unwrap());
        assert_eq!(repo.get("reg-1").unwrap().unwrap().status, PaymentStatus::Paid);
        assert!(!repo.update_status("missing", PaymentStatus::Paid).unwrap());
    }

    #[test]
    fn test_duplicate_unique_code_rejected() {
        let (_dir, db, ticket_id) = setup();
        let uow = db.begin().unwrap();
        let repo = uow.registrants();
        repo.insert(&registrant(&ticket_id)).unwrap();

        let mut other = registrant(&ticket_id);
        other.id = "reg-2".to_string();
        assert!(repo.insert(&other).is_err());
    }
}
