//! Authentication controller: sole owner of the canonical session state.
//!
//! Every transition of the `(AuthState, Session)` pair happens here, under
//! one lock, so a reader can never observe a session without a matching
//! state. Other components read snapshots or call operations; none of them
//! mutate the pair directly.

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::authority::{AuthErrorCode, Authority};
use crate::session::{AuthState, Session, SessionStore, UserProfile};

/// The canonical pair. `state == Authenticated` implies a session is
/// present; the accessors additionally evaluate expiry before reporting
/// it, since a stored record past its deadline must never read as valid.
struct Snapshot {
    state: AuthState,
    session: Option<Session>,
}

pub struct AuthController {
    authority: Arc<dyn Authority>,
    store: SessionStore,
    snapshot: Mutex<Snapshot>,
    /// Serializes in-flight validations. Overlapping calls (the periodic
    /// check racing a manual "continue session") must not interleave
    /// their writes.
    validate_gate: tokio::sync::Mutex<()>,
}

impl AuthController {
    pub fn new(authority: Arc<dyn Authority>, store: SessionStore) -> Self {
        Self {
            authority,
            store,
            snapshot: Mutex::new(Snapshot {
                state: AuthState::Initializing,
                session: None,
            }),
            validate_gate: tokio::sync::Mutex::new(()),
        }
    }

    fn snap(&self) -> MutexGuard<'_, Snapshot> {
        self.snapshot.lock().expect("session state lock poisoned")
    }

    // =========================================================================
    // Read accessors
    // =========================================================================

    /// Current coarse state. A session past its deadline is reported as
    /// `Unauthenticated` even if the record has not been torn down yet.
    pub fn state(&self) -> AuthState {
        let snap = self.snap();
        match (&snap.state, &snap.session) {
            (AuthState::Authenticated, Some(session)) if !session.is_expired() => {
                AuthState::Authenticated
            }
            (AuthState::Authenticated, _) => AuthState::Unauthenticated,
            (other, _) => *other,
        }
    }

    /// Profile of the authenticated user, or `None` once the session has
    /// passed its deadline.
    pub fn current_user(&self) -> Option<UserProfile> {
        let snap = self.snap();
        snap.session
            .as_ref()
            .filter(|session| !session.is_expired())
            .map(|session| session.profile.clone())
    }

    /// Deadline of the current session record, if one exists. May already
    /// be in the past; callers deciding trust must go through [`state`].
    ///
    /// [`state`]: AuthController::state
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.snap().session.as_ref().map(|session| session.expires_at)
    }

    // =========================================================================
    // Transitions
    // =========================================================================

    /// Authenticate against the remote authority.
    ///
    /// On success the new session replaces any previous one in a single
    /// transition and is persisted. On failure the state is left untouched
    /// and the failure code is returned as a value; the caller must
    /// discard the plaintext password either way, this operation never
    /// retries.
    pub async fn login(&self, email: &str, password: &str) -> Result<(), AuthErrorCode> {
        match self.authority.authenticate(email, password).await {
            Ok(session) => {
                let user_id = session.profile.user_id;
                let mut snap = self.snap();
                if let Err(e) = self.store.save(&session) {
                    warn!(error = %e, "Failed to persist session");
                }
                snap.session = Some(session);
                snap.state = AuthState::Authenticated;
                drop(snap);
                info!(user_id, "Login successful");
                Ok(())
            }
            Err(code) => {
                debug!(%code, "Login refused");
                Err(code)
            }
        }
    }

    /// Restore a persisted session at process start. Run once.
    ///
    /// Absent record: `Unauthenticated`. Locally expired record: the store
    /// is cleared and no authority call is made. Otherwise the token is
    /// re-validated remotely before the session is trusted; the authority
    /// being unreachable keeps the locally-valid session (see
    /// [`validate_session`]).
    ///
    /// [`validate_session`]: AuthController::validate_session
    pub async fn restore_from_store(&self) {
        let Some(session) = self.store.load() else {
            debug!("No stored session");
            self.clear_local();
            return;
        };

        if session.is_expired() {
            debug!("Stored session already expired");
            self.clear_local();
            return;
        }

        {
            let mut snap = self.snap();
            snap.session = Some(session);
            snap.state = AuthState::Authenticated;
        }
        self.validate_session().await;
    }

    /// Re-validate the current session against the authority.
    ///
    /// Accepted: the authority's fresh copy replaces the in-memory session
    /// and is re-persisted. Rejected: session and store are cleared.
    /// Authority unreachable: state is left untouched and `false` is
    /// returned, so a flaky network cannot evict a locally-valid session.
    pub async fn validate_session(&self) -> bool {
        let _gate = self.validate_gate.lock().await;

        let Some(token) = self.snap().session.as_ref().map(|s| s.token.clone()) else {
            return false;
        };

        match self.authority.validate(&token).await {
            Ok(Some(fresh)) => {
                let mut snap = self.snap();
                // A logout may have raced the call; a stale result must
                // not resurrect the session.
                if snap.session.as_ref().map(|s| s.token.as_str()) != Some(token.as_str()) {
                    debug!("Discarding validation result for a superseded session");
                    return false;
                }
                if let Err(e) = self.store.save(&fresh) {
                    warn!(error = %e, "Failed to persist refreshed session");
                }
                snap.session = Some(fresh);
                snap.state = AuthState::Authenticated;
                debug!("Session validated");
                true
            }
            Ok(None) => {
                info!("Session rejected by authority");
                self.clear_local();
                false
            }
            Err(e) => {
                warn!(error = %e, "Authority unreachable during validation, keeping session");
                false
            }
        }
    }

    /// Log out. Local teardown is unconditional and immediate; the
    /// server-side invalidation runs on a detached task and its failure
    /// never blocks or fails the logout. Calling this with no session is
    /// harmless.
    pub fn logout(&self) {
        let previous = {
            let mut snap = self.snap();
            let previous = snap.session.take();
            snap.state = AuthState::Unauthenticated;
            if let Err(e) = self.store.clear() {
                warn!(error = %e, "Failed to clear session store");
            }
            previous
        };

        if let Some(session) = previous {
            let authority = Arc::clone(&self.authority);
            tokio::spawn(async move {
                authority.invalidate(&session.token).await;
            });
            info!("Logged out");
        }
    }

    /// Tear down a session that has passed its deadline. No authority call
    /// is made, the token is already dead from its perspective. Safe to
    /// call when no session exists.
    pub fn expire_locally(&self) {
        let mut snap = self.snap();
        if snap.session.take().is_some() {
            info!("Session expired, logging out locally");
        }
        snap.state = AuthState::Unauthenticated;
        if let Err(e) = self.store.clear() {
            warn!(error = %e, "Failed to clear session store");
        }
    }

    fn clear_local(&self) {
        let mut snap = self.snap();
        snap.session = None;
        snap.state = AuthState::Unauthenticated;
        if let Err(e) = self.store.clear() {
            warn!(error = %e, "Failed to clear session store");
        }
    }

    // =========================================================================
    // Password recovery
    // =========================================================================

    /// Ask the authority to email a password-reset code. Stateless: the
    /// current session, if any, is unaffected.
    pub async fn request_password_reset(&self, email: &str) -> Result<(), AuthErrorCode> {
        self.authority.request_password_reset(email).await
    }

    /// Redeem a reset code for a new password. Stateless as well; the user
    /// still logs in normally afterwards.
    pub async fn reset_password(&self, code: &str, new_password: &str) -> Result<(), AuthErrorCode> {
        self.authority.reset_password(code, new_password).await
    }
}

// ============================================================================
// Tests
// ============================================================================
