//! Shared utility functions for request handling and identifiers.

use axum::http::HeaderMap;
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use rand::RngCore;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::error::{AppError, Result};

pub fn gen_id() -> String {
    Uuid::new_v4().to_string()
}

/// Generate an opaque license key.
///
/// Keys come from the OS CSPRNG (UUID v4, 122 random bits) and carry no
/// information about the product, consumer or issue order.
pub fn generate_license_key() -> String {
    Uuid::new_v4().to_string()
}

/// Generate a 256-bit session token, hex encoded.
pub fn generate_session_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// SHA-256 of a secret, for storage and lookup. Raw tokens are never persisted.
pub fn hash_secret(secret: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(b"licensehub-session-v1:");
    hasher.update(secret.as_bytes());
    hex::encode(hasher.finalize())
}

/// Extract a Bearer token from the Authorization header.
///
/// Returns the token string without the "Bearer " prefix, or None if
/// the header is missing, malformed, or empty after the prefix.
pub fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
}

/// A required string field: absent, empty and whitespace-only all count as missing.
pub fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Whether `id` is syntactically a record identifier.
pub fn is_valid_id(id: &str) -> bool {
    Uuid::parse_str(id).is_ok()
}

/// Validate an identifier, failing with `Invalid <field>`.
pub fn require_valid_id<'a>(id: &'a str, field: &str) -> Result<&'a str> {
    if is_valid_id(id) {
        Ok(id)
    } else {
        Err(AppError::BadRequest(format!("Invalid {}", field)))
    }
}

/// Parse a client-supplied timestamp: RFC 3339, or a bare `YYYY-MM-DD`
/// which is taken as midnight UTC.
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| AppError::BadRequest("Invalid expires timestamp".into()))
}

/// Parse an optional expiry; absent, null and empty all mean "never expires".
pub fn parse_expiry(value: Option<&str>) -> Result<Option<DateTime<Utc>>> {
    match value.map(str::trim).filter(|s| !s.is_empty()) {
        Some(v) => parse_timestamp(v).map(Some),
        None => Ok(None),
    }
}

/// Format a timestamp the way integrators receive it (millisecond RFC 3339, `Z` suffix).
pub fn format_timestamp(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// `serialize_with` helpers so API records carry the same timestamp format.
pub mod ts_millis {
    use chrono::{DateTime, Utc};
    use serde::Serializer;

    pub fn serialize<S: Serializer>(dt: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&super::format_timestamp(dt))
    }

    pub fn option<S: Serializer>(dt: &Option<DateTime<Utc>>, s: S) -> Result<S::Ok, S::Error> {
        match dt {
            Some(dt) => serialize(dt, s),
            None => s.serialize_none(),
        }
    }
}
