//! The registration workflow.
//!
//! One call books stock, records the buyer and their attendees, opens a
//! gateway transaction and stores a pending order, all inside a single unit
//! of work. Any failure along the way drops the unit of work, which rolls
//! back every booking made so far.
//!
//! The unit of work holds the SQLite write lock while the gateway call is in
//! flight. Every other writer waits on that lock for at most the database busy
//! timeout, so the gateway call is cut off at [`gateway_deadline`], well
//! before any waiter gives up.

use std::collections::HashMap;
use std::time::{Duration as StdDuration, Instant};

use chrono::{Duration, NaiveDate, Utc};
use tracing::{info, warn};

use super::codes::generate_unique;
use super::types::{
    Attendee, RegisterRequest, RegisterResponse, Registrant, RegistrationError, TicketDemand,
};
use crate::config::{Config, RegistrationConfig};
use crate::inventory::TicketType;
use crate::metrics::{PAYMENT_GATEWAY_DURATION, REGISTRATIONS_TOTAL};
use crate::order::Order;
use crate::payment::{
    CreateTransactionRequest, Customer, LineItem, PaymentError, PaymentGateways, PaymentStatus,
};
use crate::store::Database;

/// Longest a registration waits on the gateway while holding the write lock:
/// three quarters of the busy timeout other writers are willing to wait.
pub fn gateway_deadline(busy_timeout: StdDuration) -> StdDuration {
    busy_timeout * 3 / 4
}

#[derive(Debug, Clone)]
pub struct RegistrationService {
    db: Database,
    gateways: PaymentGateways,
    rules: RegistrationConfig,
    expiry_minutes: u32,
}

impl RegistrationService {
    pub fn new(
        db: Database,
        gateways: PaymentGateways,
        rules: RegistrationConfig,
        expiry_minutes: u32,
    ) -> Self {
        Self {
            db,
            gateways,
            rules,
            expiry_minutes,
        }
    }

    pub fn from_config(db: Database, gateways: PaymentGateways, config: &Config) -> Self {
        Self::new(
            db,
            gateways,
            config.registration.clone(),
            config.payment.expiry_minutes,
        )
    }

    /// Register a buyer and their attendees and open a payment transaction.
    ///
    /// On success the booked units stay booked until the order settles.
    pub async fn register(
        &self,
        request: RegisterRequest,
    ) -> Result<RegisterResponse, RegistrationError> {
        let result = self.run(&request).await;

        let label = match &result {
            Ok(_) => "created",
            Err(RegistrationError::TooManyTickets { .. })
            | Err(RegistrationError::UnknownTicket(_))
            | Err(RegistrationError::Validation(_)) => "rejected",
            Err(RegistrationError::InsufficientStock { .. }) => "sold_out",
            Err(RegistrationError::Gateway(_)) => "gateway_error",
            Err(_) => "error",
        };
        REGISTRATIONS_TOTAL.with_label_values(&[label]).inc();

        if let Err(ref e) = result {
            warn!(email = %request.registrant.email, error = %e, "Registration failed");
        }
        result
    }

    async fn run(&self, request: &RegisterRequest) -> Result<RegisterResponse, RegistrationError> {
        let requested = request.ticket_count();
        if requested > self.rules.max_tickets {
            return Err(RegistrationError::TooManyTickets {
                requested,
                max: self.rules.max_tickets,
            });
        }

        let birthdates = validate(request)?;
        let demand = TicketDemand::from_ticket_ids(request.ticket_ids());
        let provider = self.gateways.default_provider()?;

        let uow = self.db.begin_async().await?;

        let tickets: HashMap<String, TicketType> = uow
            .tickets()
            .find_sellable(&demand.ticket_ids())?
            .into_iter()
            .map(|t| (t.id.clone(), t))
            .collect();
        if let Some(missing) = request.ticket_ids().find(|id| !tickets.contains_key(*id)) {
            return Err(RegistrationError::UnknownTicket(missing.to_string()));
        }

        for (ticket_id, qty) in demand.iter() {
            uow.ledger().book_stock(ticket_id, qty)?;
        }

        let mut items = Vec::new();
        let mut amount: i64 = 0;
        for (ticket_id, qty) in demand.iter() {
            let ticket = tickets
                .get(ticket_id)
                .ok_or_else(|| RegistrationError::UnknownTicket(ticket_id.to_string()))?;
            amount = ticket
                .price
                .checked_mul(qty)
                .and_then(|line| amount.checked_add(line))
                .ok_or_else(|| RegistrationError::Validation("order total overflows".to_string()))?;
            items.push(LineItem {
                id: ticket.id.clone(),
                name: ticket.title.clone(),
                price: ticket.price,
                quantity: qty,
            });
        }

        let codes = generate_unique(&uow, &self.rules.code_prefix, &request.registrant.email)?;
        let now = Utc::now();

        let registrant = Registrant {
            id: uuid::Uuid::new_v4().to_string(),
            unique_code: codes.unique_code,
            ticket_id: request.registrant.ticket_id.clone(),
            name: request.registrant.name.trim().to_string(),
            email: request.registrant.email.trim().to_string(),
            phone: request.registrant.phone.trim().to_string(),
            gender: request.registrant.gender.clone(),
            birthdate: birthdates.registrant,
            total_cost: amount,
            total_tickets: demand.total_units(),
            status: PaymentStatus::Pending,
            created_at: now,
            updated_at: now,
        };
        uow.registrants().insert(&registrant)?;

        for (data, birthdate) in request.attendees.iter().zip(birthdates.attendees) {
            uow.registrants().insert_attendee(&Attendee {
                id: uuid::Uuid::new_v4().to_string(),
                registrant_id: registrant.id.clone(),
                ticket_id: data.ticket_id.clone(),
                name: data.name.trim().to_string(),
                gender: data.gender.clone(),
                birthdate,
                created_at: now,
            })?;
        }

        let transaction = CreateTransactionRequest {
            order_number: codes.order_number,
            amount,
            customer: Customer {
                name: registrant.name.clone(),
                email: registrant.email.clone(),
                phone: registrant.phone.clone(),
            },
            items,
            expiry_minutes: self.expiry_minutes,
        };

        let gateway = provider.gateway();
        let deadline = gateway_deadline(self.db.busy_timeout());
        let start = Instant::now();
        let created = tokio::time::timeout(deadline, provider.create_transaction(&transaction))
            .await
            .unwrap_or(Err(PaymentError::Timeout(deadline)));
        PAYMENT_GATEWAY_DURATION
            .with_label_values(&[
                gateway.as_str(),
                if created.is_ok() { "success" } else { "error" },
            ])
            .observe(start.elapsed().as_secs_f64());
        let created = created?;

        let order = Order {
            id: uuid::Uuid::new_v4().to_string(),
            registrant_id: registrant.id.clone(),
            order_number: transaction.order_number,
            amount,
            currency: self.rules.currency.clone(),
            payment_gateway: gateway,
            payment_method: None,
            payment_status: PaymentStatus::Pending,
            payment_token: Some(created.token.clone()),
            payment_url: Some(created.redirect_url.clone()),
            payment_transaction_id: created.transaction_id,
            payment_metadata: None,
            payment_time: None,
            expires_at: now + Duration::minutes(i64::from(self.expiry_minutes)),
            created_at: now,
            updated_at: now,
        };
        uow.orders().insert(&order)?;

        uow.commit()?;

        info!(
            order_number = %order.order_number,
            unique_code = %registrant.unique_code,
            amount,
            tickets = registrant.total_tickets,
            "Registration created"
        );

        Ok(RegisterResponse {
            order_id: order.id,
            order_number: order.order_number,
            amount,
            currency: order.currency,
            payment_status: order.payment_status,
            payment_token: created.token,
            redirect_url: created.redirect_url,
            expires_at: order.expires_at,
            registrant_id: registrant.id,
            unique_code: registrant.unique_code,
        })
    }
}

#[derive(Debug)]
struct Birthdates {
    registrant: Option<NaiveDate>,
    attendees: Vec<Option<NaiveDate>>,
}

/// Check participant fields and parse their birthdates.
fn validate(request: &RegisterRequest) -> Result<Birthdates, RegistrationError> {
    let registrant = &request.registrant;
    require(&registrant.ticket_id, "registrant.ticket_id")?;
    require(&registrant.name, "registrant.name")?;
    require(&registrant.phone, "registrant.phone")?;

    let email = registrant.email.trim();
    if email.is_empty() || !email.contains('@') || email.contains(char::is_whitespace) {
        return Err(RegistrationError::Validation(format!(
            "registrant.email is not a valid address: {:?}",
            registrant.email
        )));
    }

    let registrant_birthdate =
        parse_birthdate(registrant.birthdate.as_deref(), "registrant.birthdate")?;

    let mut attendees = Vec::with_capacity(request.attendees.len());
    for (i, attendee) in request.attendees.iter().enumerate() {
        require(&attendee.ticket_id, &format!("attendees[{}].ticket_id", i))?;
        require(&attendee.name, &format!("attendees[{}].name", i))?;
        attendees.push(parse_birthdate(
            attendee.birthdate.as_deref(),
            &format!("attendees[{}].birthdate", i),
        )?);
    }

    Ok(Birthdates {
        registrant: registrant_birthdate,
        attendees,
    })
}

fn require(value: &str, field: &str) -> Result<(), RegistrationError> {
    if value.trim().is_empty() {
        return Err(RegistrationError::Validation(format!(
            "{} cannot be empty",
            field
        )));
    }
    Ok(())
}

fn parse_birthdate(raw: Option<&str>, field: &str) -> Result<Option<NaiveDate>, RegistrationError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| {
                RegistrationError::Validation(format!("{} must be YYYY-MM-DD, got {:?}", field, s))
            }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registration::{AttendeeData, RegistrantData};

    fn request(attendees: usize) -> RegisterRequest {
        RegisterRequest {
            registrant: RegistrantData {
                ticket_id: "gold".to_string(),
                name: "Ayu".to_string(),
                email: "ayu@example.com".to_string(),
                phone: "0812".to_string(),
                gender: None,
                birthdate: Some("1995-04-12".to_string()),
            },
            attendees: (0..attendees)
                .map(|i| AttendeeData {
                    ticket_id: "gold".to_string(),
                    name: format!("Guest {}", i),
                    gender: None,
                    birthdate: None,
                })
                .collect(),
        }
    }

    #[test]
    fn test_validate_accepts_well_formed_request() {
        let birthdates = validate(&request(2)).unwrap();
        assert_eq!(birthdates.registrant, NaiveDate::from_ymd_opt(1995, 4, 12));
        assert_eq!(birthdates.attendees, vec![None, None]);
    }

    #[test]
    fn test_validate_rejects_bad_email() {
        let mut req = request(0);
        req.registrant.email = "not-an-email".to_string();
        assert!(matches!(
            validate(&req),
            Err(RegistrationError::Validation(_))
        ));
    }

    #[test]
    fn test_validate_rejects_blank_attendee_name() {
        let mut req = request(1);
        req.attendees[0].name = "  ".to_string();
        let err = validate(&req).unwrap_err();
        assert!(err.to_string().contains("attendees[0].name"));
    }

    #[test]
    fn test_validate_rejects_bad_birthdate() {
        let mut req = request(0);
        req.registrant.birthdate = Some("12/04/1995".to_string());
        assert!(matches!(
            validate(&req),
            Err(RegistrationError::Validation(_))
        ));
    }

    #[test]
    fn test_gateway_deadline_leaves_headroom() {
        assert_eq!(
            gateway_deadline(StdDuration::from_secs(40)),
            StdDuration::from_secs(30)
        );
        assert!(gateway_deadline(StdDuration::from_millis(1)) < StdDuration::from_millis(1));
    }

    #[test]
    fn test_empty_birthdate_is_none() {
        assert_eq!(parse_birthdate(Some(""), "x").unwrap(), None);
        assert_eq!(parse_birthdate(None, "x").unwrap(), None);
    }
}
