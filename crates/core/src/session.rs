//! Signed session tokens and bcrypt password hashes for dashboard logins.
//!
//! A token reads `<user_id>.<ROLE>.<expires_unix>.<hex hmac-sha256>`; the
//! signature covers everything before the last dot.

use chrono::{DateTime, Duration, TimeZone, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;

use crate::access::Role;

type HmacSha256 = Hmac<Sha256>;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    pub user_id: String,
    pub role: Role,
    pub expires_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SessionToken {
    pub token: String,
    pub claims: SessionClaims,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("session token is malformed")]
    Malformed,
    #[error("session token signature does not match")]
    BadSignature,
    #[error("session token expired at {0}")]
    Expired(DateTime<Utc>),
    #[error("session token carries unknown role `{0}`")]
    UnknownRole(String),
    #[error("session signing key was rejected")]
    InvalidKey,
    #[error("session lifetime overflows the supported date range")]
    TtlOutOfRange,
}

#[derive(Debug, Error)]
#[error("password hashing failed: {0}")]
pub struct PasswordHashError(#[from] bcrypt::BcryptError);

#[derive(Clone)]
pub struct SessionSigner {
    key: Vec<u8>,
}

impl std::fmt::Debug for SessionSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionSigner").field("key", &"[REDACTED]").finish()
    }
}

impl SessionSigner {
    pub fn new(key: impl AsRef<[u8]>) -> Self {
        Self { key: key.as_ref().to_vec() }
    }

    pub fn issue(
        &self,
        user_id: &str,
        role: Role,
        ttl: Duration,
    ) -> Result<SessionToken, SessionError> {
        let expires_at = Utc::now().checked_add_signed(ttl).ok_or(SessionError::TtlOutOfRange)?;
        self.issue_at(user_id, role, expires_at)
    }

    pub fn issue_at(
        &self,
        user_id: &str,
        role: Role,
        expires_at: DateTime<Utc>,
    ) -> Result<SessionToken, SessionError> {
        let payload = format!("{user_id}.{}.{}", role.as_str(), expires_at.timestamp());
        let mut mac = self.mac()?;
        mac.update(payload.as_bytes());
        let signature = encode_hex(mac.finalize().into_bytes().as_slice());
        let expires_at =
            Utc.timestamp_opt(expires_at.timestamp(), 0).single().unwrap_or(expires_at);

        Ok(SessionToken {
            token: format!("{payload}.{signature}"),
            claims: SessionClaims { user_id: user_id.to_string(), role, expires_at },
        })
    }

    pub fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<SessionClaims, SessionError> {
        let (payload, signature) = token.trim().rsplit_once('.').ok_or(SessionError::Malformed)?;
        let signature = decode_hex(signature).ok_or(SessionError::Malformed)?;

        let mut mac = self.mac()?;
        mac.update(payload.as_bytes());
        mac.verify_slice(&signature).map_err(|_| SessionError::BadSignature)?;

        let mut parts = payload.rsplitn(3, '.');
        let expires = parts.next().ok_or(SessionError::Malformed)?;
        let role = parts.next().ok_or(SessionError::Malformed)?;
        let user_id = parts.next().filter(|id| !id.is_empty()).ok_or(SessionError::Malformed)?;

        let role = role.parse::<Role>().map_err(|_| SessionError::UnknownRole(role.to_string()))?;
        let expires_at = expires
            .parse::<i64>()
            .ok()
            .and_then(|seconds| Utc.timestamp_opt(seconds, 0).single())
            .ok_or(SessionError::Malformed)?;

        if expires_at <= now {
            return Err(SessionError::Expired(expires_at));
        }

        Ok(SessionClaims { user_id: user_id.to_string(), role, expires_at })
    }

    fn mac(&self) -> Result<HmacSha256, SessionError> {
        HmacSha256::new_from_slice(&self.key).map_err(|_| SessionError::InvalidKey)
    }
}

/// bcrypt hash of `password`. Salt and cost are embedded in the returned string.
pub fn hash_password(password: &str) -> Result<String, PasswordHashError> {
    Ok(bcrypt::hash(password, bcrypt::DEFAULT_COST)?)
}

/// Malformed stored hashes count as a mismatch.
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    bcrypt::verify(password, stored_hash).unwrap_or(false)
}

fn encode_hex(bytes: &[u8]) -> String {
    let mut output = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        output.push_str(&format!("{byte:02x}"));
    }
    output
}

fn decode_hex(value: &str) -> Option<Vec<u8>> {
    if value.len() % 2 != 0 || !value.is_ascii() {
        return None;
    }
    (0..value.len())
        .step_by(2)
        .map(|index| u8::from_str_radix(&value[index..index + 2], 16).ok())
        .collect()
}
