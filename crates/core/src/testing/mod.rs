//! Testing utilities and mock implementations.
//!
//! This module provides a mock payment gateway and database fixtures, so
//! workflows can be exercised end to end against a throwaway SQLite file
//! without talking to a real gateway.
//!
//! # Example
//!
//! ```rust,ignore
//! use boxoffice_core::testing::{fixtures, MockPaymentProvider};
//!
//! let dir = tempfile::tempdir()?;
//! let db = fixtures::database(dir.path());
//! let gold = fixtures::ticket_type(&db, "Gold", 150_000, 10);
//!
//! let provider = Arc::new(MockPaymentProvider::new());
//! let service = fixtures::registration_service(&db, provider.clone());
//! ```

mod mock_payment;

pub use mock_payment::MockPaymentProvider;

/// Test fixtures and helper functions.
///
/// Fixtures panic on failure; they are meant for tests only.
pub mod fixtures {
    use std::path::Path;
    use std::sync::Arc;

    use chrono::{Duration, Utc};

    use super::MockPaymentProvider;
    use crate::config::RegistrationConfig;
    use crate::inventory::{NewTicketType, TicketType};
    use crate::order::Order;
    use crate::payment::{GatewayType, PaymentGateways, PaymentStatus};
    use crate::registration::{
        Attendee, AttendeeData, RegisterRequest, Registrant, RegistrantData,
        RegistrationService,
    };
    use crate::settlement::SettlementService;
    use crate::store::Database;

    /// Open a fresh database inside `dir`.
    pub fn database(dir: &Path) -> Database {
        Database::open(&dir.join("boxoffice-test.db")).expect("open test database")
    }

    /// Open a fresh database whose writers give up waiting for the lock
    /// after `busy_timeout`.
    pub fn database_with_busy_timeout(dir: &Path, busy_timeout: std::time::Duration) -> Database {
        Database::with_busy_timeout(&dir.join("boxoffice-test.db"), busy_timeout)
            .expect("open test database")
    }

    /// Create a ticket type with every unit available.
    pub fn ticket_type(db: &Database, title: &str, price: i64, total: i64) -> TicketType {
        let uow = db.begin().expect("begin");
        let kind = title.to_uppercase().replace(' ', "_");
        let ticket = uow
            .tickets()
            .insert(&NewTicketType::new(kind, title, price, total))
            .expect("insert ticket type");
        uow.commit().expect("commit");
        ticket
    }

    /// Fetch a ticket type's current state.
    pub fn reload(db: &Database, ticket_id: &str) -> TicketType {
        let uow = db.read().expect("read");
        uow.tickets()
            .get(ticket_id)
            .expect("get ticket type")
            .expect("ticket type exists")
    }

    /// A registration for one registrant per listed ticket id, the first
    /// being the registrant and the rest attendees.
    pub fn register_request(ticket_ids: &[&str]) -> RegisterRequest {
        let (first, rest) = ticket_ids
            .split_first()
            .expect("at least one ticket id");
        RegisterRequest {
            registrant: RegistrantData {
                ticket_id: first.to_string(),
                name: "Ayu Lestari".to_string(),
                email: "ayu@example.com".to_string(),
                phone: "+6281234567890".to_string(),
                gender: Some("F".to_string()),
                birthdate: Some("1995-04-12".to_string()),
            },
            attendees: rest
                .iter()
                .enumerate()
                .map(|(i, id)| AttendeeData {
                    ticket_id: id.to_string(),
                    name: format!("Guest {}", i + 1),
                    gender: None,
                    birthdate: None,
                })
                .collect(),
        }
    }

    /// Registration rules used by the fixtures: default limits, prefix "JMF".
    pub fn registration_rules() -> RegistrationConfig {
        RegistrationConfig {
            max_tickets: 4,
            code_prefix: "JMF".to_string(),
            currency: "IDR".to_string(),
        }
    }

    pub fn gateways(provider: Arc<MockPaymentProvider>) -> PaymentGateways {
        PaymentGateways::new(GatewayType::Midtrans).with_provider(provider)
    }

    pub fn registration_service(
        db: &Database,
        provider: Arc<MockPaymentProvider>,
    ) -> RegistrationService {
        RegistrationService::new(db.clone(), gateways(provider), registration_rules(), 60)
    }

    pub fn settlement_service(
        db: &Database,
        provider: Arc<MockPaymentProvider>,
    ) -> SettlementService {
        SettlementService::new(db.clone(), gateways(provider))
    }

    /// Book stock and store a pending order for one registrant holding
    /// `ticket_id` plus `attendees` extra holders of the same ticket type,
    /// bypassing the gateway. Returns the order number.
    pub fn pending_order(db: &Database, ticket_id: &str, attendees: usize) -> String {
        let uow = db.begin().expect("begin");
        let qty = 1 + attendees as i64;
        uow.ledger().book_stock(ticket_id, qty).expect("book stock");

        let ticket = uow
            .tickets()
            .get(ticket_id)
            .expect("get ticket type")
            .expect("ticket type exists");
        let now = Utc::now();
        let suffix = uuid::Uuid::new_v4().simple().to_string()[..8].to_uppercase();

        let registrant = Registrant {
            id: uuid::Uuid::new_v4().to_string(),
            unique_code: format!("JMF-2026-{}", suffix),
            ticket_id: ticket_id.to_string(),
            name: "Ayu Lestari".to_string(),
            email: "ayu@example.com".to_string(),
            phone: "+6281234567890".to_string(),
            gender: None,
            birthdate: None,
            total_cost: ticket.price * qty,
            total_tickets: qty,
            status: PaymentStatus::Pending,
            created_at: now,
            updated_at: now,
        };
        uow.registrants().insert(&registrant).expect("insert registrant");

        for i in 0..attendees {
            uow.registrants()
                .insert_attendee(&Attendee {
                    id: uuid::Uuid::new_v4().to_string(),
                    registrant_id: registrant.id.clone(),
                    ticket_id: ticket_id.to_string(),
                    name: format!("Guest {}", i + 1),
                    gender: None,
                    birthdate: None,
                    created_at: now,
                })
                .expect("insert attendee");
        }

        let order_number = format!("JMF2026-{}", suffix);
        uow.orders()
            .insert(&Order {
                id: uuid::Uuid::new_v4().to_string(),
                registrant_id: registrant.id.clone(),
                order_number: order_number.clone(),
                amount: registrant.total_cost,
                currency: "IDR".to_string(),
                payment_gateway: GatewayType::Midtrans,
                payment_method: None,
                payment_status: PaymentStatus::Pending,
                payment_token: Some("fixture-token".to_string()),
                payment_url: Some("https://pay.example.test/fixture".to_string()),
                payment_transaction_id: None,
                payment_metadata: None,
                payment_time: None,
                expires_at: now + Duration::minutes(60),
                created_at: now,
                updated_at: now,
            })
            .expect("insert order");

        uow.commit().expect("commit");
        order_number
    }
}
