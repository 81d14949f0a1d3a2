//! Order rows.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::types::{Order, OrderError};
use crate::payment::{GatewayType, PaymentNotification, PaymentStatus};
use crate::store::{
    corrupt_column, format_timestamp, optional_timestamp_column, timestamp_column, UnitOfWork,
};

const COLUMNS: &str = "id, registrant_id, order_number, amount, currency, payment_gateway, \
                       payment_method, payment_status, payment_token, payment_url, \
                       payment_transaction_id, payment_metadata, payment_time, expires_at, \
                       created_at, updated_at";

impl UnitOfWork {
    /// Order repository scoped to this unit of work.
    pub fn orders(&self) -> OrderRepository<'_> {
        OrderRepository { conn: self.conn() }
    }
}

pub struct OrderRepository<'a> {
    conn: &'a Connection,
}

impl OrderRepository<'_> {
    pub fn insert(&self, order: &Order) -> Result<(), OrderError> {
        self.conn.execute(
            "INSERT INTO orders (id, registrant_id, order_number, amount, currency, payment_gateway, payment_method, payment_status, payment_token, payment_url, payment_transaction_id, payment_metadata, payment_time, expires_at, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
            params![
                order.id,
                order.registrant_id,
                order.order_number,
                order.amount,
                order.currency,
                order.payment_gateway.as_str(),
                order.payment_method,
                order.payment_status.as_str(),
                order.payment_token,
                order.payment_url,
                order.payment_transaction_id,
                order.payment_metadata,
                order.payment_time.as_ref().map(format_timestamp),
                format_timestamp(&order.expires_at),
                format_timestamp(&order.created_at),
                format_timestamp(&order.updated_at),
            ],
        )?;
        Ok(())
    }

    pub fn find_by_number(&self, order_number: &str) -> Result<Option<Order>, OrderError> {
        let sql = format!("SELECT {} FROM orders WHERE order_number = ?1", COLUMNS);
        let order = self
            .conn
            .query_row(&sql, params![order_number], row_to_order)
            .optional()?;
        Ok(order)
    }

    pub fn order_number_exists(&self, order_number: &str) -> Result<bool, OrderError> {
        let exists = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM orders WHERE order_number = ?1)",
            params![order_number],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    /// Store the gateway fields of a notification without touching the status.
    pub fn record_notification(
        &self,
        order_id: &str,
        notification: &PaymentNotification,
    ) -> Result<(), OrderError> {
        let changed = self.conn.execute(
            "UPDATE orders
             SET payment_method = COALESCE(?2, payment_method),
                 payment_transaction_id = COALESCE(?3, payment_transaction_id),
                 payment_metadata = ?4,
                 updated_at = ?5
             WHERE id = ?1",
            params![
                order_id,
                notification.payment_type,
                notification.transaction_id,
                notification.raw_payload,
                format_timestamp(&Utc::now()),
            ],
        )?;
        if changed == 0 {
            return Err(OrderError::NotFound(order_id.to_string()));
        }
        Ok(())
    }

    /// Move a pending order to the notification's status.
    ///
    /// Matches only while the order is still pending; returns `false` if it
    /// already left that state.
    pub fn settle(
        &self,
        order_id: &str,
        notification: &PaymentNotification,
        payment_time: Option<DateTime<Utc>>,
    ) -> Result<bool, OrderError> {
        let changed = self.conn.execute(
            "UPDATE orders
             SET payment_status = ?2,
                 payment_method = COALESCE(?3, payment_method),
                 payment_transaction_id = COALESCE(?4, payment_transaction_id),
                 payment_metadata = ?5,
                 payment_time = COALESCE(?6, payment_time),
                 updated_at = ?7
             WHERE id = ?1 AND payment_status = 'pending'",
            params![
                order_id,
                notification.status.as_str(),
                notification.payment_type,
                notification.transaction_id,
                notification.raw_payload,
                payment_time.as_ref().map(format_timestamp),
                format_timestamp(&Utc::now()),
            ],
        )?;
        Ok(changed > 0)
    }
}

fn row_to_order(row: &Row<'_>) -> rusqlite::Result<Order> {
    let gateway_str: String = row.get(5)?;
    let payment_gateway: GatewayType = gateway_str
        .parse()
        .map_err(|_| corrupt_column(5, format!("unknown gateway {:?}", gateway_str)))?;

    let status_str: String = row.get(7)?;
    let payment_status = PaymentStatus::parse(&status_str)
        .ok_or_else(|| corrupt_column(7, format!("unknown payment status {:?}", status_str)))?;

    Ok(Order {
        id: row.get(0)?,
        registrant_id: row.get(1)?,
        order_number: row.get(2)?,
        amount: row.get(3)?,
        currency: row.get(4)?,
        payment_gateway,
        payment_method: row.get(6)?,
        payment_status,
        payment_token: row.get(8)?,
        payment_url: row.get(9)?,
        payment_transaction_id: row.get(10)?,
        payment_metadata: row.get(11)?,
        payment_time: optional_timestamp_column(row, 12)?,
        expires_at: timestamp_column(row, 13)?,
        created_at: timestamp_column(row, 14)?,
        updated_at: timestamp_column(row, 15)?,
    })
}
