//! The settlement workflow.
//!
//! Per order:
//!
//! ```text
//! pending --paid-------------> paid      confirm booked units as sold
//! pending --pending----------> pending   store gateway metadata only
//! pending --failed/expired---> failed/expired   release booked units
//! paid/failed/expired --any--> unchanged
//! ```
//!
//! Gateways deliver at least once. The terminal-status check is read inside
//! a write-locked unit of work, so a duplicate delivery can never apply the
//! same stock movement twice.

use chrono::Utc;
use tracing::{debug, error, info, warn};

use super::types::{SettlementError, SettlementOutcome};
use crate::inventory::InventoryError;
use crate::metrics::SETTLEMENTS_TOTAL;
use crate::payment::{GatewayType, PaymentGateways, PaymentNotification, PaymentStatus};
use crate::registration::TicketDemand;
use crate::store::{Database, StoreError};

#[derive(Debug, Clone)]
pub struct SettlementService {
    db: Database,
    gateways: PaymentGateways,
}

impl SettlementService {
    pub fn new(db: Database, gateways: PaymentGateways) -> Self {
        Self { db, gateways }
    }

    /// Handle a raw notification for a gateway named in a webhook path.
    pub fn handle_webhook(
        &self,
        gateway: &str,
        payload: &[u8],
    ) -> Result<SettlementOutcome, SettlementError> {
        let gateway: GatewayType = gateway
            .parse()
            .map_err(|_| SettlementError::UnsupportedGateway(gateway.to_string()))?;
        self.handle_notification(gateway, payload)
    }

    /// Decode a raw notification with the gateway's provider and apply it.
    pub fn handle_notification(
        &self,
        gateway: GatewayType,
        payload: &[u8],
    ) -> Result<SettlementOutcome, SettlementError> {
        let result = self.decode(gateway, payload).and_then(|n| self.apply(&n));

        match &result {
            Ok(outcome) => SETTLEMENTS_TOTAL.with_label_values(&[outcome.label()]).inc(),
            Err(e) => {
                SETTLEMENTS_TOTAL.with_label_values(&["error"]).inc();
                warn!(gateway = %gateway, error = %e, "Payment notification not applied");
            }
        }
        result
    }

    fn decode(
        &self,
        gateway: GatewayType,
        payload: &[u8],
    ) -> Result<PaymentNotification, SettlementError> {
        let provider = self
            .gateways
            .get(gateway)
            .map_err(|_| SettlementError::UnsupportedGateway(gateway.to_string()))?;
        provider
            .parse_webhook(payload)
            .map_err(SettlementError::Payload)
    }

    /// Apply an already-decoded notification.
    pub fn apply(
        &self,
        notification: &PaymentNotification,
    ) -> Result<SettlementOutcome, SettlementError> {
        let order_number = notification.order_number.as_str();
        let uow = self.db.begin()?;

        let order = uow
            .orders()
            .find_by_number(order_number)?
            .ok_or_else(|| SettlementError::OrderNotFound(order_number.to_string()))?;

        if order.payment_status.is_terminal() {
            uow.commit()?;
            info!(
                order_number = %order_number,
                status = %order.payment_status,
                received = %notification.status,
                "Ignoring notification for settled order"
            );
            return Ok(SettlementOutcome::Duplicate {
                status: order.payment_status,
            });
        }

        if notification.status == PaymentStatus::Pending {
            uow.orders().record_notification(&order.id, notification)?;
            uow.commit()?;
            debug!(order_number = %order_number, "Stored pending notification metadata");
            return Ok(SettlementOutcome::MetadataUpdated);
        }

        let registrant = uow
            .registrants()
            .get(&order.registrant_id)?
            .ok_or_else(|| SettlementError::RegistrantNotFound(order_number.to_string()))?;
        let attendees = uow.registrants().attendees(&registrant.id)?;
        let demand = TicketDemand::from_ticket_ids(
            std::iter::once(registrant.ticket_id.as_str())
                .chain(attendees.iter().map(|a| a.ticket_id.as_str())),
        );

        let ledger = uow.ledger();
        for (ticket_id, qty) in demand.iter() {
            let moved = match notification.status {
                PaymentStatus::Paid => ledger.confirm_sold(ticket_id, qty),
                _ => ledger.release_booked(ticket_id, qty),
            };
            if let Err(e) = moved {
                return Err(ledger_failure(order_number, e));
            }
        }

        let payment_time = (notification.status == PaymentStatus::Paid).then(Utc::now);
        if !uow
            .orders()
            .settle(&order.id, notification, payment_time)?
        {
            return Err(SettlementError::Store(StoreError::Corrupt(format!(
                "order {} left pending during settlement",
                order_number
            ))));
        }
        uow.registrants()
            .update_status(&registrant.id, notification.status)?;

        uow.commit()?;

        info!(
            order_number = %order_number,
            from = %order.payment_status,
            to = %notification.status,
            tickets = demand.total_units(),
            "Order settled"
        );

        Ok(SettlementOutcome::Applied {
            from: order.payment_status,
            to: notification.status,
        })
    }
}

fn ledger_failure(order_number: &str, e: InventoryError) -> SettlementError {
    match e {
        InventoryError::Store(e) => SettlementError::Store(e),
        source => {
            error!(order_number = %order_number, error = %source, "Booked stock does not cover order");
            SettlementError::Ledger {
                order_number: order_number.to_string(),
                source,
            }
        }
    }
}
