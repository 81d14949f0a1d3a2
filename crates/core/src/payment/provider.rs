use async_trait::async_trait;

use super::types::{
    CreateTransactionRequest, CreateTransactionResponse, GatewayType, PaymentError,
    PaymentNotification,
};

/// A payment gateway: opens transactions and decodes its own notifications.
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    /// The gateway brand this provider talks to.
    fn gateway(&self) -> GatewayType;

    /// Open a transaction and return where the buyer should pay.
    async fn create_transaction(
        &self,
        request: &CreateTransactionRequest,
    ) -> Result<CreateTransactionResponse, PaymentError>;

    /// Decode and authenticate a raw notification body.
    fn parse_webhook(&self, payload: &[u8]) -> Result<PaymentNotification, PaymentError>;
}
