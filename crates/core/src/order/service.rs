use super::types::{OrderDetails, OrderError};
use crate::store::Database;

/// Read-only order lookups for status polling.
#[derive(Debug, Clone)]
pub struct OrderService {
    db: Database,
}

impl OrderService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Find an order by its order number, with its registrant and attendees.
    pub fn find(&self, order_number: &str) -> Result<OrderDetails, OrderError> {
        let uow = self.db.read()?;

        let order = uow
            .orders()
            .find_by_number(order_number)?
            .ok_or_else(|| OrderError::NotFound(order_number.to_string()))?;
        let registrant = uow
            .registrants()
            .get(&order.registrant_id)?
            .ok_or_else(|| OrderError::RegistrantMissing(order_number.to_string()))?;
        let attendees = uow.registrants().attendees(&registrant.id)?;

        Ok(OrderDetails {
            order,
            registrant,
            attendees,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payment::{GatewayType, PaymentNotification, PaymentStatus};
    use crate::testing::fixtures;

    #[test]
    fn test_find_returns_order_with_people() {
        let dir = tempfile::tempdir().unwrap();
        let db = fixtures::database(dir.path());
        let ticket = fixtures::ticket_type(&db, "Gold", 100_000, 10);
        let order_number = fixtures::pending_order(&db, &ticket.id, 2);

        let details = OrderService::new(db).find(&order_number).unwrap();
        assert_eq!(details.order.order_number, order_number);
        assert_eq!(details.order.payment_status, PaymentStatus::Pending);
        assert_eq!(details.order.payment_gateway, GatewayType::Midtrans);
        assert_eq!(details.registrant.id, details.order.registrant_id);
        assert_eq!(details.attendees.len(), 2);
    }

    #[test]
    fn test_find_unknown_order() {
        let dir = tempfile::tempdir().unwrap();
        let db = fixtures::database(dir.path());
        assert!(matches!(
            OrderService::new(db).find("JMF2026-MISSING0"),
            Err(OrderError::NotFound(_))
        ));
    }

    #[test]
    fn test_settle_only_matches_pending_orders() {
        let dir = tempfile::tempdir().unwrap();
        let db = fixtures::database(dir.path());
        let ticket = fixtures::ticket_type(&db, "Gold", 100_000, 10);
        let order_number = fixtures::pending_order(&db, &ticket.id, 0);

        let uow = db.begin().unwrap();
        let order = uow.orders().find_by_number(&order_number).unwrap().unwrap();
        let notification = PaymentNotification {
            order_number: order_number.clone(),
            transaction_id: Some("tx-9".to_string()),
            status: PaymentStatus::Paid,
            payment_type: Some("gopay".to_string()),
            gateway: GatewayType::Midtrans,
            raw_payload: "{}".to_string(),
        };

        assert!(uow
            .orders()
            .settle(&order.id, &notification, Some(chrono::Utc::now()))
            .unwrap());
        assert!(!uow.orders().settle(&order.id, &notification, None).unwrap());

        let settled = uow.orders().find_by_number(&order_number).unwrap().unwrap();
        assert_eq!(settled.payment_status, PaymentStatus::Paid);
        assert_eq!(settled.payment_method.as_deref(), Some("gopay"));
        assert_eq!(settled.payment_transaction_id.as_deref(), Some("tx-9"));
        assert!(settled.payment_time.is_some());
    }

    #[test]
    fn test_record_notification_keeps_status() {
        let dir = tempfile::tempdir().unwrap();
        let db = fixtures::database(dir.path());
        let ticket = fixtures::ticket_type(&db, "Gold", 100_000, 10);
        let order_number = fixtures::pending_order(&db, &ticket.id, 0);

        let uow = db.begin().unwrap();
        let order = uow.orders().find_by_number(&order_number).unwrap().unwrap();
        let notification = PaymentNotification {
            order_number: order_number.clone(),
            transaction_id: Some("tx-1".to_string()),
            status: PaymentStatus::Pending,
            payment_type: Some("bank_transfer".to_string()),
            gateway: GatewayType::Midtrans,
            raw_payload: r#"{"transaction_status":"pending"}"#.to_string(),
        };
        uow.orders().record_notification(&order.id, &notification).unwrap();

        let updated = uow.orders().find_by_number(&order_number).unwrap().unwrap();
        assert_eq!(updated.payment_status, PaymentStatus::Pending);
        assert_eq!(updated.payment_method.as_deref(), Some("bank_transfer"));
        assert_eq!(
            updated.payment_metadata.as_deref(),
            Some(r#"{"transaction_status":"pending"}"#)
        );
        assert!(uow.orders().order_number_exists(&order_number).unwrap());
        assert!(matches!(
            uow.orders().record_notification("missing", &notification),
            Err(OrderError::NotFound(_))
        ));
    }
}
