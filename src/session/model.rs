use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Coarse authentication state gating application access.
///
/// "Expiring soon" is deliberately not a state here: it is a transient UI
/// condition computed from the session deadline, so there is no second
/// piece of bookkeeping to keep in sync with `expires_at`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    /// Startup restore has not finished yet.
    Initializing,
    /// No trusted session.
    Unauthenticated,
    /// A current, unexpired session exists.
    Authenticated,
}

/// Display snapshot of the authenticated user, denormalized from the
/// authority at the last successful validation. May be stale in between.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: i64,
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub role: Option<String>,
}

/// An authenticated session: who the user is, the bearer token proving it,
/// and the absolute deadline after which neither matters.
///
/// The token is crate-private. It leaves this struct only through the
/// controller's authority calls and the store's persistence path, and the
/// `Debug` impl redacts it so it cannot reach a log sink.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub profile: UserProfile,
    pub(crate) token: String,
    /// Last successful authority contact (login or validation).
    pub validated_at: DateTime<Utc>,
    /// Deadline after which the session is unconditionally invalid,
    /// independent of any later remote check.
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }

    pub fn time_until_expiry(&self) -> Duration {
        self.expires_at - Utc::now()
    }

    /// Minutes remaining until expiry, rounded up for display: 4 m 59 s
    /// reads as "5 minutes".
    pub fn minutes_until_expiry(&self) -> i64 {
        ceil_minutes(self.time_until_expiry())
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("profile", &self.profile)
            .field("token", &"<redacted>")
            .field("validated_at", &self.validated_at)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Whole minutes in `d`, rounded up. Negative durations clamp to zero.
pub(crate) fn ceil_minutes(d: Duration) -> i64 {
    let secs = d.num_seconds();
    if secs <= 0 {
        0
    } else {
        (secs + 59) / 60
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::session_expiring_in;

    #[test]
    fn test_session_is_expired_past_deadline() {
        assert!(session_expiring_in(-1).is_expired());
        assert!(!session_expiring_in(60).is_expired());
    }

    #[test]
    fn test_minutes_until_expiry_rounds_up() {
        // 4 m 59 s must read as 5 minutes, matching the warning dialog.
        assert_eq!(session_expiring_in(299).minutes_until_expiry(), 5);
        assert_eq!(session_expiring_in(300).minutes_until_expiry(), 5);
        assert_eq!(session_expiring_in(301).minutes_until_expiry(), 6);
    }

    #[test]
    fn test_minutes_until_expiry_clamps_at_zero() {
        assert_eq!(session_expiring_in(-30).minutes_until_expiry(), 0);
    }

    #[test]
    fn test_ceil_minutes() {
        assert_eq!(ceil_minutes(Duration::seconds(0)), 0);
        assert_eq!(ceil_minutes(Duration::seconds(1)), 1);
        assert_eq!(ceil_minutes(Duration::seconds(60)), 1);
        assert_eq!(ceil_minutes(Duration::seconds(61)), 2);
        assert_eq!(ceil_minutes(Duration::seconds(-10)), 0);
    }

    #[test]
    fn test_debug_redacts_token() {
        let session = session_expiring_in(600);
        let rendered = format!("{:?}", session);
        assert!(!rendered.contains(&session.token));
        assert!(rendered.contains("<redacted>"));
    }
}
