use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Credentials issued by the login family of endpoints and by `refresh`.
///
/// This mirrors the `data` payload the server returns; `expired_at` is Unix
/// epoch seconds.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    /// Short-lived bearer credential.
    pub token: String,

    /// Coarse role marker, e.g. "admin".
    pub scope: String,

    /// Long-lived credential exchanged for a new access token.
    pub refresh_token: String,

    /// Expiry of `token` in Unix-epoch seconds; `0` means unknown.
    #[serde(default)]
    pub expired_at: i64,
}

impl core::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Credentials")
            .field("token", &"<redacted>")
            .field("scope", &self.scope)
            .field("refresh_token", &"<redacted>")
            .field("expired_at", &self.expired_at)
            .finish()
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CredentialError {
    #[error("access token has expired")]
    Expired,

    #[error("access token expiry is unknown")]
    UnknownExpiry,
}

/// Expiry as a timestamp, `None` when unknown (`<= 0` or out of range).
pub fn expiry_instant(expires_at: i64) -> Option<DateTime<Utc>> {
    if expires_at <= 0 {
        return None;
    }
    Utc.timestamp_opt(expires_at, 0).single()
}

/// Deterministically check a locally known expiry.
///
/// Note: a passing check does not make a token valid. The validation endpoint
/// is the only authority; this is used for scheduling and diagnostics.
pub fn validate_expiry(expires_at: i64, now: DateTime<Utc>) -> Result<(), CredentialError> {
    let expiry = expiry_instant(expires_at).ok_or(CredentialError::UnknownExpiry)?;
    if now >= expiry {
        return Err(CredentialError::Expired);
    }
    Ok(())
}

/// Time left before `expires_at`, `None` when unknown or already expired.
pub fn remaining(expires_at: i64, now: DateTime<Utc>) -> Option<Duration> {
    let expiry = expiry_instant(expires_at)?;
    let left = expiry.signed_duration_since(now);
    (left > Duration::zero()).then_some(left)
}
