//! Authentication and caller-identity helpers.
//!
//! The expected API key is resolved once at startup and handed in by the caller; nothing
//! here reads the environment. When no key is configured the instance runs open, which is
//! the development default.

use axum::http::HeaderMap;

/// Header carrying the API key.
pub const API_KEY_HEADER: &str = "x-api-key";
/// Header carrying the caller's email for audit attribution.
pub const USER_EMAIL_HEADER: &str = "x-user-email";
/// Identity attached to audit entries when the caller does not supply one.
pub const SYSTEM_USER: &str = "system";

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("missing API key")]
    MissingKey,
    #[error("invalid API key")]
    InvalidKey,
}

/// Validates the provided API key against the key resolved at startup.
///
/// Returns `Ok(())` when `expected_key` is `None` (open instance) or when the `x-api-key`
/// header matches it.
///
/// # Errors
///
/// Returns `AuthError::MissingKey` when a key is required but absent, and
/// `AuthError::InvalidKey` when it does not match.
pub fn validate_api_key(expected_key: Option<&str>, headers: &HeaderMap) -> Result<(), AuthError> {
    let Some(expected) = expected_key else {
        return Ok(());
    };

    let provided = headers
        .get(API_KEY_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or(AuthError::MissingKey)?;

    if provided == expected {
        Ok(())
    } else {
        Err(AuthError::InvalidKey)
    }
}

/// The caller identity for audit attribution, taken from `x-user-email`.
///
/// Falls back to [`SYSTEM_USER`] when the header is absent or blank.
pub fn caller_email(headers: &HeaderMap) -> String {
    headers
        .get(USER_EMAIL_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|email| !email.is_empty())
        .map(ToString::to_string)
        .unwrap_or_else(|| SYSTEM_USER.to_string())
}
