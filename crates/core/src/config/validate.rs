use std::time::Duration;

use super::{types::Config, ConfigError};
use crate::payment::GatewayType;
use crate::registration::gateway_deadline;

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Registration rules are usable
/// - The default gateway has credentials
/// - Gateway calls finish before a waiting writer's busy timeout runs out
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    if config.registration.max_tickets == 0 {
        return Err(ConfigError::ValidationError(
            "registration.max_tickets must be at least 1".to_string(),
        ));
    }

    if config.registration.code_prefix.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "registration.code_prefix cannot be empty".to_string(),
        ));
    }

    if config.registration.currency.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "registration.currency cannot be empty".to_string(),
        ));
    }

    if config.payment.expiry_minutes == 0 {
        return Err(ConfigError::ValidationError(
            "payment.expiry_minutes must be at least 1".to_string(),
        ));
    }

    if config.database.busy_timeout_ms == 0 {
        return Err(ConfigError::ValidationError(
            "database.busy_timeout_ms must be at least 1".to_string(),
        ));
    }

    let deadline = gateway_deadline(Duration::from_millis(config.database.busy_timeout_ms));
    if let Some(midtrans) = &config.payment.midtrans {
        if Duration::from_secs(u64::from(midtrans.timeout_secs)) > deadline {
            return Err(ConfigError::ValidationError(format!(
                "payment.midtrans.timeout_secs ({}s) exceeds {:?}, three quarters of \
                 database.busy_timeout_ms; raise busy_timeout_ms to at least {}",
                midtrans.timeout_secs,
                deadline,
                (u64::from(midtrans.timeout_secs) * 4000 + 2) / 3
            )));
        }
    }

    match config.payment.default_gateway {
        GatewayType::Midtrans => match &config.payment.midtrans {
            Some(midtrans) if !midtrans.server_key.trim().is_empty() => {}
            Some(_) => {
                return Err(ConfigError::ValidationError(
                    "payment.midtrans.server_key cannot be empty".to_string(),
                ))
            }
            None => {
                return Err(ConfigError::ValidationError(
                    "payment.default_gateway is midtrans but [payment.midtrans] is missing"
                        .to_string(),
                ))
            }
        },
    }

    Ok(())
}
