use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::session::{Session, UserProfile};

use super::{AuthErrorCode, AuthorityError};

/// Contract with the remote authority.
///
/// Implementations must keep the two failure classes apart: a rejection is
/// an answer, a transport failure is the absence of one.
#[async_trait]
pub trait Authority: Send + Sync {
    /// Verify credentials and issue a fresh session.
    async fn authenticate(&self, email: &str, password: &str) -> Result<Session, AuthErrorCode>;

    /// Ask whether `token` is still accepted. `Ok(None)` is an explicit
    /// rejection; `Err` means the authority could not be reached.
    async fn validate(&self, token: &str) -> Result<Option<Session>, AuthorityError>;

    /// Best-effort server-side token invalidation. Failures are not
    /// surfaced; local logout never depends on this call.
    async fn invalidate(&self, token: &str);

    /// Ask the authority to email a password-reset code.
    async fn request_password_reset(&self, email: &str) -> Result<(), AuthErrorCode>;

    /// Redeem a reset code for a new password.
    async fn reset_password(&self, code: &str, new_password: &str) -> Result<(), AuthErrorCode>;
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct TokenRequest<'a> {
    token: &'a str,
}

#[derive(Serialize)]
struct PasswordResetRequest<'a> {
    email: &'a str,
}

#[derive(Serialize)]
struct ConfirmResetRequest<'a> {
    code: &'a str,
    new_password: &'a str,
}

/// Session payload as the authority returns it. The local record stamps
/// `validated_at` at receipt time; the expiry is always the authority's.
#[derive(Deserialize)]
struct SessionPayload {
    token: String,
    user_id: i64,
    name: Option<String>,
    email: Option<String>,
    phone: Option<String>,
    role: Option<String>,
    expires_at: DateTime<Utc>,
}

impl SessionPayload {
    fn into_session(self) -> Session {
        Session {
            profile: UserProfile {
                user_id: self.user_id,
                name: self.name,
                email: self.email,
                phone: self.phone,
                role: self.role,
            },
            token: self.token,
            validated_at: Utc::now(),
            expires_at: self.expires_at,
        }
    }
}

/// Error body the authority attaches to refused auth requests.
#[derive(Deserialize)]
struct ErrorBody {
    code: AuthErrorCode,
}

/// HTTP implementation of the authority contract.
/// Clone is cheap, reqwest::Client shares its connection pool internally.
#[derive(Clone)]
pub struct HttpAuthority {
    client: Client,
    base_url: String,
}

impl HttpAuthority {
    /// Create a client for the authority at `base_url`. The timeout bounds
    /// every call; a timed-out call reads as authority-unavailable, not as
    /// rejection.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Read the structured failure code from an error response, falling
    /// back to a status-based mapping when the body carries none.
    async fn failure_code(response: reqwest::Response) -> AuthErrorCode {
        let status = response.status();
        match response.json::<ErrorBody>().await {
            Ok(body) => body.code,
            Err(_) => AuthErrorCode::from_status(status),
        }
    }
}

#[async_trait]
impl Authority for HttpAuthority {
    async fn authenticate(&self, email: &str, password: &str) -> Result<Session, AuthErrorCode> {
        let response = self
            .client
            .post(self.url("/auth/login"))
            .json(&LoginRequest { email, password })
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "Authentication request failed");
                AuthErrorCode::from_transport(&e)
            })?;

        if response.status().is_success() {
            let payload: SessionPayload = response.json().await.map_err(|e| {
                warn!(error = %e, "Failed to parse authentication response");
                AuthErrorCode::UnknownError
            })?;
            Ok(payload.into_session())
        } else {
            Err(Self::failure_code(response).await)
        }
    }

    async fn validate(&self, token: &str) -> Result<Option<Session>, AuthorityError> {
        let response = self
            .client
            .post(self.url("/auth/validate"))
            .json(&TokenRequest { token })
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            let payload: SessionPayload = response.json().await?;
            Ok(Some(payload.into_session()))
        } else if matches!(status.as_u16(), 401 | 403 | 404 | 410) {
            // The authority looked at the token and said no.
            Ok(None)
        } else if status.is_server_error() {
            Err(AuthorityError::Network(format!("server error {}", status)))
        } else {
            Err(AuthorityError::InvalidResponse(format!(
                "unexpected status {}",
                status
            )))
        }
    }

    async fn invalidate(&self, token: &str) {
        let result = self
            .client
            .post(self.url("/auth/logout"))
            .json(&TokenRequest { token })
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => {
                debug!("Server-side token invalidated");
            }
            Ok(response) => {
                debug!(status = %response.status(), "Token invalidation refused");
            }
            Err(e) => {
                debug!(error = %e, "Token invalidation failed");
            }
        }
    }

    async fn request_password_reset(&self, email: &str) -> Result<(), AuthErrorCode> {
        let response = self
            .client
            .post(self.url("/auth/password-reset"))
            .json(&PasswordResetRequest { email })
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "Password reset request failed");
                AuthErrorCode::from_transport(&e)
            })?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(Self::failure_code(response).await)
        }
    }

    async fn reset_password(&self, code: &str, new_password: &str) -> Result<(), AuthErrorCode> {
        let response = self
            .client
            .post(self.url("/auth/password-reset/confirm"))
            .json(&ConfirmResetRequest { code, new_password })
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "Password reset confirmation failed");
                AuthErrorCode::from_transport(&e)
            })?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(Self::failure_code(response).await)
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let authority =
            HttpAuthority::new("https://auth.example.com/", Duration::from_secs(30)).expect("client");
        assert_eq!(
            authority.url("/auth/login"),
            "https://auth.example.com/auth/login"
        );
    }

    #[test]
    fn test_session_payload_into_session() {
        let payload: SessionPayload = serde_json::from_str(
            r#"{
                "token": "tok-123",
                "user_id": 42,
                "name": "Ana Rojas",
                "email": "ana@example.com",
                "phone": null,
                "role": "admin",
                "expires_at": "2099-01-01T00:00:00Z"
            }"#,
        )
        .expect("parse payload");

        let session = payload.into_session();
        assert_eq!(session.profile.user_id, 42);
        assert_eq!(session.profile.role.as_deref(), Some("admin"));
        assert!(!session.is_expired());
        // Stamped at receipt, so it can only be "now or earlier".
        assert!(session.validated_at <= Utc::now());
    }

    #[test]
    fn test_error_body_parses_wire_code() {
        let body: ErrorBody =
            serde_json::from_str(r#"{"code": "INVALID_CREDENTIALS"}"#).expect("parse body");
        assert_eq!(body.code, AuthErrorCode::InvalidCredentials);
    }
}
