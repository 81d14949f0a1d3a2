use std::collections::HashMap;
use std::sync::Arc;

use super::midtrans::MidtransProvider;
use super::provider::PaymentProvider;
use super::types::{GatewayType, PaymentError};
use crate::config::PaymentConfig;

/// Configured payment providers, keyed by gateway.
#[derive(Clone)]
pub struct PaymentGateways {
    providers: HashMap<GatewayType, Arc<dyn PaymentProvider>>,
    default_gateway: GatewayType,
}

impl PaymentGateways {
    /// Empty registry whose new registrations go to `default_gateway`.
    pub fn new(default_gateway: GatewayType) -> Self {
        Self {
            providers: HashMap::new(),
            default_gateway,
        }
    }

    /// Build a provider for every gateway section present in the config.
    pub fn from_config(config: &PaymentConfig) -> Result<Self, PaymentError> {
        let mut gateways = Self::new(config.default_gateway);
        if let Some(ref midtrans) = config.midtrans {
            gateways = gateways.with_provider(Arc::new(MidtransProvider::new(midtrans)?));
        }

        if !gateways.providers.contains_key(&config.default_gateway) {
            return Err(PaymentError::NotConfigured(
                config.default_gateway.to_string(),
            ));
        }
        Ok(gateways)
    }

    /// Register a provider under its own gateway, replacing any previous one.
    pub fn with_provider(mut self, provider: Arc<dyn PaymentProvider>) -> Self {
        self.providers.insert(provider.gateway(), provider);
        self
    }

    pub fn get(&self, gateway: GatewayType) -> Result<Arc<dyn PaymentProvider>, PaymentError> {
        self.providers
            .get(&gateway)
            .cloned()
            .ok_or_else(|| PaymentError::NotConfigured(gateway.to_string()))
    }

    /// Provider used for new registrations.
    pub fn default_provider(&self) -> Result<Arc<dyn PaymentProvider>, PaymentError> {
        self.get(self.default_gateway)
    }

    pub fn default_gateway(&self) -> GatewayType {
        self.default_gateway
    }

    pub fn gateways(&self) -> Vec<GatewayType> {
        self.providers.keys().copied().collect()
    }
}

impl std::fmt::Debug for PaymentGateways {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaymentGateways")
            .field("gateways", &self.gateways())
            .field("default_gateway", &self.default_gateway)
            .finish()
    }
}
