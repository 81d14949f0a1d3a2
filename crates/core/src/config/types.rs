use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;

use crate::payment::GatewayType;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub registration: RegistrationConfig,
    pub payment: PaymentConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}

fn default_port() -> u16 {
    8000
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
    /// How long a unit of work waits for the SQLite write lock. Registrations
    /// hold that lock across the gateway call, so this must exceed the gateway
    /// timeout by a third.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            busy_timeout_ms: default_busy_timeout_ms(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("boxoffice.db")
}

fn default_busy_timeout_ms() -> u64 {
    45_000
}

/// Registration rules
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RegistrationConfig {
    /// Ticket units allowed per registration, registrant included.
    #[serde(default = "default_max_tickets")]
    pub max_tickets: usize,
    /// Prefix for unique codes and order numbers (e.g. "JMF").
    #[serde(default = "default_code_prefix")]
    pub code_prefix: String,
    /// ISO 4217 currency for every order.
    #[serde(default = "default_currency")]
    pub currency: String,
}

impl Default for RegistrationConfig {
    fn default() -> Self {
        Self {
            max_tickets: default_max_tickets(),
            code_prefix: default_code_prefix(),
            currency: default_currency(),
        }
    }
}

fn default_max_tickets() -> usize {
    4
}

fn default_code_prefix() -> String {
    "JMF".to_string()
}

fn default_currency() -> String {
    "IDR".to_string()
}

/// Payment configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PaymentConfig {
    /// Gateway used for new registrations.
    #[serde(default = "default_gateway")]
    pub default_gateway: GatewayType,
    /// Minutes before the provider expires an unpaid transaction.
    #[serde(default = "default_expiry_minutes")]
    pub expiry_minutes: u32,
    #[serde(default)]
    pub midtrans: Option<MidtransConfig>,
}

fn default_gateway() -> GatewayType {
    GatewayType::Midtrans
}

fn default_expiry_minutes() -> u32 {
    60
}

/// Midtrans Snap configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MidtransConfig {
    pub server_key: String,
    /// Use the production endpoint instead of the sandbox.
    #[serde(default)]
    pub production: bool,
    /// Reject notifications whose `signature_key` does not match.
    #[serde(default = "default_verify_signature")]
    pub verify_signature: bool,
    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
}

fn default_verify_signature() -> bool {
    true
}

fn default_timeout() -> u32 {
    30
}

/// Sanitized config for API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub registration: RegistrationConfig,
    pub payment: SanitizedPaymentConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedPaymentConfig {
    pub default_gateway: String,
    pub expiry_minutes: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub midtrans: Option<SanitizedMidtransConfig>,
}

/// Sanitized Midtrans config (server key hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedMidtransConfig {
    pub server_key_configured: bool,
    pub production: bool,
    pub verify_signature: bool,
    pub timeout_secs: u32,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            server: config.server.clone(),
            database: config.database.clone(),
            registration: config.registration.clone(),
            payment: SanitizedPaymentConfig {
                default_gateway: config.payment.default_gateway.as_str().to_string(),
                expiry_minutes: config.payment.expiry_minutes,
                midtrans: config
                    .payment
                    .midtrans
                    .as_ref()
                    .map(|m| SanitizedMidtransConfig {
                        server_key_configured: !m.server_key.is_empty(),
                        production: m.production,
                        verify_signature: m.verify_signature,
                        timeout_secs: m.timeout_secs,
                    }),
            },
        }
    }
}
