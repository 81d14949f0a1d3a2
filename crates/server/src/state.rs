use boxoffice_core::{
    Config, Database, InventoryService, OrderService, PaymentGateways, RegistrationService,
    SanitizedConfig, SettlementService,
};

/// Shared application state
pub struct AppState {
    config: Config,
    gateways: PaymentGateways,
    inventory: InventoryService,
    registration: RegistrationService,
    settlement: SettlementService,
    orders: OrderService,
}

impl AppState {
    pub fn new(config: Config, db: Database, gateways: PaymentGateways) -> Self {
        Self {
            inventory: InventoryService::new(db.clone()),
            registration: RegistrationService::from_config(db.clone(), gateways.clone(), &config),
            settlement: SettlementService::new(db.clone(), gateways.clone()),
            orders: OrderService::new(db),
            gateways,
            config,
        }
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn gateways(&self) -> &PaymentGateways {
        &self.gateways
    }

    pub fn inventory(&self) -> &InventoryService {
        &self.inventory
    }

    pub fn registration(&self) -> &RegistrationService {
        &self.registration
    }

    pub fn settlement(&self) -> &SettlementService {
        &self.settlement
    }

    pub fn orders(&self) -> &OrderService {
        &self.orders
    }
}
