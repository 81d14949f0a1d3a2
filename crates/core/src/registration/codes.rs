//! Human-readable registrant codes and order numbers.
//!
//! Both share one suffix: the first eight hex digits (upper-cased) of a
//! SHA-256 over the buyer's e-mail, the current time and a random UUID.
//! `JMF-2026-3FA94C1B` is the registrant's unique code, `JMF2026-3FA94C1B`
//! the order number.

use chrono::{DateTime, Datelike, Utc};
use sha2::{Digest, Sha256};
use tracing::debug;

use super::types::RegistrationError;
use crate::store::UnitOfWork;

/// Attempts before giving up on finding an unused suffix.
pub const MAX_CODE_ATTEMPTS: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Codes {
    pub unique_code: String,
    pub order_number: String,
}

impl Codes {
    pub fn new(prefix: &str, year: i32, suffix: &str) -> Self {
        Self {
            unique_code: format!("{}-{}-{}", prefix, year, suffix),
            order_number: format!("{}{}-{}", prefix, year, suffix),
        }
    }
}

/// Eight-character suffix derived from `email`, `now` and `nonce`.
pub fn code_suffix(email: &str, now: &DateTime<Utc>, nonce: &uuid::Uuid) -> String {
    let mut hasher = Sha256::new();
    hasher.update(email.trim().to_lowercase().as_bytes());
    hasher.update(now.timestamp_nanos_opt().unwrap_or_default().to_be_bytes());
    hasher.update(nonce.as_bytes());
    let digest = format!("{:x}", hasher.finalize());
    digest[..8].to_uppercase()
}

/// Pick codes that no registrant or order uses yet.
///
/// The check runs inside the caller's unit of work, which holds the write
/// lock, so nothing can claim the same codes before it commits.
pub(crate) fn generate_unique(
    uow: &UnitOfWork,
    prefix: &str,
    email: &str,
) -> Result<Codes, RegistrationError> {
    generate_unique_with(uow, prefix, || {
        code_suffix(email, &Utc::now(), &uuid::Uuid::new_v4())
    })
}

/// [`generate_unique`] drawing suffixes from `next_suffix`.
pub(crate) fn generate_unique_with(
    uow: &UnitOfWork,
    prefix: &str,
    mut next_suffix: impl FnMut() -> String,
) -> Result<Codes, RegistrationError> {
    for attempt in 1..=MAX_CODE_ATTEMPTS {
        let codes = Codes::new(prefix, Utc::now().year(), &next_suffix());

        let taken = uow.registrants().unique_code_exists(&codes.unique_code)?
            || uow.orders().order_number_exists(&codes.order_number)?;
        if !taken {
            return Ok(codes);
        }
        debug!(attempt, unique_code = %codes.unique_code, "Code collision, regenerating");
    }

    Err(RegistrationError::CodeGeneration(MAX_CODE_ATTEMPTS))
}
