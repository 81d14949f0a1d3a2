//! Ticket type rows.
//!
//! Only descriptive fields are written here. Stock counters change through
//! [`super::TicketLedger`].

use chrono::Utc;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

use super::types::{
    InventoryError, NewTicketType, TicketStatus, TicketType, TicketTypeFilter, TicketTypeUpdate,
};
use crate::store::{corrupt_column, format_timestamp, timestamp_column, UnitOfWork};

const COLUMNS: &str = "id, kind, title, description, price, total, available, booked, sold, \
                       status, is_presale, order_priority, deleted, created_at, updated_at";

impl UnitOfWork {
    /// Ticket type repository scoped to this unit of work.
    pub fn tickets(&self) -> TicketRepository<'_> {
        TicketRepository { conn: self.conn() }
    }
}

pub struct TicketRepository<'a> {
    conn: &'a Connection,
}

impl TicketRepository<'_> {
    /// Insert a new ticket type with every unit available.
    pub fn insert(&self, new: &NewTicketType) -> Result<TicketType, InventoryError> {
        new.validate()?;

        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now();
        let status = TicketStatus::derive(new.total, 0);

        self.conn.execute(
            "INSERT INTO ticket_types (id, kind, title, description, price, total, available, booked, sold, status, is_presale, order_priority, deleted, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6, 0, 0, ?7, ?8, ?9, 0, ?10, ?10)",
            params![
                id,
                new.kind,
                new.title,
                new.description,
                new.price,
                new.total,
                status.as_str(),
                new.is_presale,
                new.order_priority,
                format_timestamp(&now),
            ],
        )?;

        Ok(TicketType {
            id,
            kind: new.kind.clone(),
            title: new.title.clone(),
            description: new.description.clone(),
            price: new.price,
            total: new.total,
            available: new.total,
            booked: 0,
            sold: 0,
            status,
            is_presale: new.is_presale,
            order_priority: new.order_priority,
            deleted: false,
            created_at: now,
            updated_at: now,
        })
    }

    /// Get a ticket type by ID, soft-deleted or not.
    pub fn get(&self, id: &str) -> Result<Option<TicketType>, InventoryError> {
        let sql = format!("SELECT {} FROM ticket_types WHERE id = ?1", COLUMNS);
        let ticket = self
            .conn
            .query_row(&sql, params![id], row_to_ticket_type)
            .optional()?;
        Ok(ticket)
    }

    /// Fetch the ticket types that can still be sold among `ids`.
    ///
    /// Unknown and soft-deleted IDs are simply missing from the result.
    pub fn find_sellable(&self, ids: &[&str]) -> Result<Vec<TicketType>, InventoryError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = vec!["?"; ids.len()].join(", ");
        let sql = format!(
            "SELECT {} FROM ticket_types WHERE deleted = 0 AND id IN ({})",
            COLUMNS, placeholders
        );

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(ids.iter()), row_to_ticket_type)?;

        let mut tickets = Vec::with_capacity(ids.len());
        for row in rows {
            tickets.push(row?);
        }
        Ok(tickets)
    }

    /// List ticket types matching the filter.
    pub fn list(&self, filter: &TicketTypeFilter) -> Result<Vec<TicketType>, InventoryError> {
        let (where_clause, params) = build_where_clause(filter);
        let sql = format!(
            "SELECT {} FROM ticket_types {} ORDER BY order_priority ASC, title ASC",
            COLUMNS, where_clause
        );

        let param_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(param_refs.as_slice(), row_to_ticket_type)?;

        let mut tickets = Vec::new();
        for row in rows {
            tickets.push(row?);
        }
        Ok(tickets)
    }

    /// Apply the descriptive part of an update. `total` is ignored here.
    ///
    /// Returns `false` when the ticket type does not exist.
    pub fn update_details(
        &self,
        id: &str,
        update: &TicketTypeUpdate,
    ) -> Result<bool, InventoryError> {
        let mut assignments = vec!["updated_at = ?"];
        let mut params: Vec<Box<dyn rusqlite::ToSql>> =
            vec![Box::new(format_timestamp(&Utc::now()))];

        if let Some(ref kind) = update.kind {
            assignments.push("kind = ?");
            params.push(Box::new(kind.clone()));
        }
        if let Some(ref title) = update.title {
            assignments.push("title = ?");
            params.push(Box::new(title.clone()));
        }
        if let Some(ref description) = update.description {
            assignments.push("description = ?");
            params.push(Box::new(description.clone()));
        }
        if let Some(price) = update.price {
            assignments.push("price = ?");
            params.push(Box::new(price));
        }
        if let Some(is_presale) = update.is_presale {
            assignments.push("is_presale = ?");
            params.push(Box::new(is_presale));
        }
        if let Some(order_priority) = update.order_priority {
            assignments.push("order_priority = ?");
            params.push(Box::new(order_priority));
        }

        let sql = format!(
            "UPDATE ticket_types SET {} WHERE id = ?",
            assignments.join(", ")
        );
        params.push(Box::new(id.to_string()));

        let param_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();
        let changed = self.conn.execute(&sql, param_refs.as_slice())?;
        Ok(changed > 0)
    }

    /// Exclude a ticket type from future sales.
    ///
    /// Returns `false` when the ticket type does not exist.
    pub fn soft_delete(&self, id: &str) -> Result<bool, InventoryError> {
        let changed = self.conn.execute(
            "UPDATE ticket_types SET deleted = 1, updated_at = ?1 WHERE id = ?2",
            params![format_timestamp(&Utc::now()), id],
        )?;
        Ok(changed > 0)
    }
}

fn build_where_clause(filter: &TicketTypeFilter) -> (String, Vec<Box<dyn rusqlite::ToSql>>) {
    let mut conditions = Vec::new();
    let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

    if !filter.include_deleted {
        conditions.push("deleted = 0");
    }

    if let Some(is_presale) = filter.is_presale {
        conditions.push("is_presale = ?");
        params.push(Box::new(is_presale));
    }

    if let Some(ref kind) = filter.kind {
        conditions.push("kind = ?");
        params.push(Box::new(kind.clone()));
    }

    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    };

    (where_clause, params)
}

fn row_to_ticket_type(row: &Row<'_>) -> rusqlite::Result<TicketType> {
    let status_str: String = row.get(9)?;
    let status = TicketStatus::parse(&status_str)
        .ok_or_else(|| corrupt_column(9, format!("unknown ticket status {:?}", status_str)))?;

    Ok(TicketType {
        id: row.get(0)?,
        kind: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        price: row.get(4)?,
        total: row.get(5)?,
        available: row.get(6)?,
        booked: row.get(7)?,
        sold: row.get(8)?,
        status,
        is_presale: row.get(10)?,
        order_priority: row.get(11)?,
        deleted: row.get(12)?,
        created_at: timestamp_column(row, 13)?,
        updated_at: timestamp_column(row, 14)?,
    })
}
