//! Shared test fixtures: a scriptable in-process authority, session
//! builders, and a store wired to a temp directory.

use std::ops::Deref;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{Duration, Utc};

use crate::authority::{AuthErrorCode, Authority, AuthorityError};
use crate::controller::AuthController;
use crate::session::{Session, SessionStore, UserProfile};

pub fn profile(user_id: i64) -> UserProfile {
    UserProfile {
        user_id,
        name: Some("Ana Rojas".to_string()),
        email: Some("ana@example.com".to_string()),
        phone: Some("+56 9 5555 0100".to_string()),
        role: Some("tecnico".to_string()),
    }
}

/// A session whose deadline sits `seconds` from now (negative for an
/// already-expired one). Tokens are unique per call so refreshed sessions
/// are distinguishable from the ones they replace.
pub fn session_expiring_in(seconds: i64) -> Session {
    static NEXT_TOKEN: AtomicUsize = AtomicUsize::new(0);
    let token = format!("tok-{:04}", NEXT_TOKEN.fetch_add(1, Ordering::SeqCst));
    Session {
        profile: profile(7),
        token,
        validated_at: Utc::now(),
        expires_at: Utc::now() + Duration::seconds(seconds),
    }
}

/// Scriptable authority: tests choose each call's answer up front and can
/// count how often every operation was hit.
#[derive(Default)]
pub struct MockAuthority {
    authenticate_result: Mutex<Option<Result<Session, AuthErrorCode>>>,
    validate_result: Mutex<Option<Result<Option<Session>, AuthorityError>>>,
    pub authenticate_calls: AtomicUsize,
    pub validate_calls: AtomicUsize,
    pub invalidate_calls: AtomicUsize,
}

impl MockAuthority {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn accept_login(&self, session: Session) {
        *self.authenticate_result.lock().expect("lock") = Some(Ok(session));
    }

    pub fn refuse_login(&self, code: AuthErrorCode) {
        *self.authenticate_result.lock().expect("lock") = Some(Err(code));
    }

    pub fn accept_validate(&self, session: Session) {
        *self.validate_result.lock().expect("lock") = Some(Ok(Some(session)));
    }

    pub fn refuse_validate(&self) {
        *self.validate_result.lock().expect("lock") = Some(Ok(None));
    }

    pub fn fail_validate(&self) {
        *self.validate_result.lock().expect("lock") =
            Some(Err(AuthorityError::Network("connection refused".to_string())));
    }
}

#[async_trait]
impl Authority for MockAuthority {
    async fn authenticate(&self, _email: &str, _password: &str) -> Result<Session, AuthErrorCode> {
        self.authenticate_calls.fetch_add(1, Ordering::SeqCst);
        self.authenticate_result
            .lock()
            .expect("lock")
            .clone()
            .unwrap_or(Err(AuthErrorCode::UnknownError))
    }

    async fn validate(&self, _token: &str) -> Result<Option<Session>, AuthorityError> {
        self.validate_calls.fetch_add(1, Ordering::SeqCst);
        self.validate_result
            .lock()
            .expect("lock")
            .clone()
            .unwrap_or(Ok(None))
    }

    async fn invalidate(&self, _token: &str) {
        self.invalidate_calls.fetch_add(1, Ordering::SeqCst);
    }

    async fn request_password_reset(&self, email: &str) -> Result<(), AuthErrorCode> {
        if email.ends_with("@example.com") {
            Ok(())
        } else {
            Err(AuthErrorCode::EmailNotRegistered)
        }
    }

    async fn reset_password(&self, _code: &str, _new_password: &str) -> Result<(), AuthErrorCode> {
        Ok(())
    }
}

/// A second handle on the controller's storage directory, so tests can
/// inspect or seed what the controller persists. Keeps the temp dir alive.
pub struct TestStore {
    store: SessionStore,
    _dir: tempfile::TempDir,
}

impl Deref for TestStore {
    type Target = SessionStore;

    fn deref(&self) -> &SessionStore {
        &self.store
    }
}

pub fn controller_with(authority: Arc<MockAuthority>) -> (Arc<AuthController>, TestStore) {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().to_path_buf();
    let store = SessionStore::open(path.clone()).expect("store");
    let probe = TestStore {
        store: SessionStore::open(path).expect("probe store"),
        _dir: dir,
    };
    (Arc::new(AuthController::new(authority, store)), probe)
}

/// A controller already holding `session`, via the normal login path.
pub async fn authenticated_controller(
    session: Session,
) -> (Arc<AuthController>, Arc<MockAuthority>, TestStore) {
    let authority = MockAuthority::new();
    authority.accept_login(session);
    let (controller, store) = controller_with(Arc::clone(&authority));
    controller
        .login("ana@example.com", "secret")
        .await
        .expect("test login");
    (controller, authority, store)
}
