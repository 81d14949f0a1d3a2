pub mod config;
pub mod inventory;
pub mod metrics;
pub mod order;
pub mod payment;
pub mod registration;
pub mod settlement;
pub mod store;
pub mod testing;

pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, SanitizedConfig,
};
pub use inventory::{
    InventoryError, InventoryService, NewTicketType, TicketStatus, TicketType, TicketTypeFilter,
    TicketTypeUpdate,
};
pub use order::{Order, OrderDetails, OrderError, OrderService};
pub use payment::{
    GatewayType, MidtransProvider, PaymentError, PaymentGateways, PaymentNotification,
    PaymentProvider, PaymentStatus,
};
pub use registration::{
    gateway_deadline, RegisterRequest, RegisterResponse, RegistrationError, RegistrationService,
};
pub use settlement::{SettlementError, SettlementOutcome, SettlementService};
pub use store::{Database, StoreError, UnitOfWork};
