//! Local inspection of JWT access tokens.
//!
//! Signatures are never checked here: the API does that. The payload is only
//! decoded to learn when the token expires so it can be refreshed before a
//! request fails.

use base64ct::{Base64UrlUnpadded, Encoding};
use serde::Deserialize;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum JwtError {
    #[error("invalid token format")]
    TokenFormat,
    #[error("invalid base64url encoding")]
    Base64,
    #[error("invalid json")]
    Json(#[from] serde_json::Error),
}

/// Registered claims the session layer cares about.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct Claims {
    #[serde(default)]
    pub exp: Option<f64>,
    #[serde(default)]
    pub iat: Option<f64>,
    #[serde(default)]
    pub user_id: Option<serde_json::Value>,
    #[serde(default)]
    pub token_type: Option<String>,
}

impl Claims {
    /// Expiry as unix seconds.
    #[must_use]
    pub fn expires_at(&self) -> Option<u64> {
        self.exp
            .filter(|exp| exp.is_finite() && *exp >= 0.0)
            .map(|exp| exp as u64)
    }
}

/// Decodes the payload segment of a compact JWT.
///
/// # Errors
/// Returns an error if the token is not three dot-separated segments or the
/// payload is not base64url-encoded JSON.
pub fn decode_claims(token: &str) -> Result<Claims, JwtError> {
    let mut segments = token.trim().split('.');
    let (Some(_header), Some(payload), Some(_signature), None) = (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) else {
        return Err(JwtError::TokenFormat);
    };

    let bytes = Base64UrlUnpadded::decode_vec(payload.trim_end_matches('='))
        .map_err(|_| JwtError::Base64)?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Expiry of the token, if it is a JWT carrying `exp`.
#[must_use]
pub fn expires_at(token: &str) -> Option<u64> {
    decode_claims(token).ok()?.expires_at()
}

/// Whether the token expires within `leeway` of `now_unix`.
///
/// Opaque tokens and tokens without `exp` are never considered expired; the
/// API remains the authority for those.
#[must_use]
pub fn is_expired_at(token: &str, now_unix: u64, leeway: Duration) -> bool {
    expires_at(token).is_some_and(|exp| exp <= now_unix.saturating_add(leeway.as_secs()))
}

/// [`is_expired_at`] against the system clock.
#[must_use]
pub fn is_expired(token: &str, leeway: Duration) -> bool {
    is_expired_at(token, now_unix(), leeway)
}

#[must_use]
pub fn now_unix() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| elapsed.as_secs())
}

/// Builds an unsigned token around `claims`; only used by tests.
#[cfg(test)]
pub(crate) fn unsigned_token(claims: &serde_json::Value) -> String {
    let header = Base64UrlUnpadded::encode_string(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = Base64UrlUnpadded::encode_string(claims.to_string().as_bytes());
    format!("{header}.{payload}.signature")
}
