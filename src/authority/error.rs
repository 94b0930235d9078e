use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a login or password-reset request was refused.
///
/// This is the complete set the UI layer has to present; the variants are
/// stable codes, not messages, so wording stays out of this crate. The
/// serialized form matches the authority's wire strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthErrorCode {
    #[error("USER_NOT_FOUND")]
    UserNotFound,
    #[error("INVALID_PASSWORD")]
    InvalidPassword,
    #[error("USER_NO_PASSWORD")]
    UserNoPassword,
    #[error("INVALID_CREDENTIALS")]
    InvalidCredentials,
    #[error("EMAIL_NOT_REGISTERED")]
    EmailNotRegistered,
    #[error("EMAIL_SERVICE_ERROR")]
    EmailServiceError,
    #[error("NETWORK_ERROR")]
    NetworkError,
    #[error("UNKNOWN_ERROR")]
    UnknownError,
}

impl AuthErrorCode {
    /// Fallback mapping for an error response whose body carried no
    /// structured code.
    pub(crate) fn from_status(status: reqwest::StatusCode) -> Self {
        match status.as_u16() {
            401 | 403 => AuthErrorCode::InvalidCredentials,
            404 => AuthErrorCode::UserNotFound,
            502..=504 => AuthErrorCode::NetworkError,
            _ => AuthErrorCode::UnknownError,
        }
    }

    /// Mapping for a request that never produced a response.
    pub(crate) fn from_transport(err: &reqwest::Error) -> Self {
        if err.is_decode() {
            AuthErrorCode::UnknownError
        } else {
            AuthErrorCode::NetworkError
        }
    }
}

/// Transport or availability failure reaching the authority.
///
/// Kept separate from [`AuthErrorCode`]: "the authority could not be
/// asked" must never be conflated with "the authority said no". A
/// validation call that fails this way leaves the local session alone.
#[derive(Debug, Clone, Error)]
pub enum AuthorityError {
    #[error("request timed out")]
    Timeout,

    #[error("network error: {0}")]
    Network(String),

    #[error("unexpected response: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for AuthorityError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AuthorityError::Timeout
        } else if err.is_decode() {
            AuthorityError::InvalidResponse(err.to_string())
        } else {
            AuthorityError::Network(err.to_string())
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
