//! Session lifecycle and access gating for the Shopdesk desktop client.
//!
//! This crate owns the authenticated-session state machine underneath the
//! application shell: credential login against the remote authority,
//! persistence of the session across process restarts, periodic remote
//! re-validation, a pre-expiry warning with an explicit "continue session"
//! path, and the single decision point that gates protected views.
//!
//! The shell wires the pieces together roughly like this:
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use shopdesk_session::{
//!     AccessGate, AuthController, AuthState, ExpirationMonitor, HttpAuthority,
//!     SessionConfig, SessionStore,
//! };
//!
//! # async fn wire() -> anyhow::Result<()> {
//! let config = SessionConfig::default().validated();
//! let authority = Arc::new(HttpAuthority::new(
//!     "https://auth.shopdesk.example",
//!     config.request_timeout,
//! )?);
//! let store = SessionStore::open(config.session_dir()?)?;
//! let controller = Arc::new(AuthController::new(authority, store));
//!
//! controller.restore_from_store().await;
//!
//! let (monitor, _events) = ExpirationMonitor::new(Arc::clone(&controller), &config);
//! if controller.state() == AuthState::Authenticated {
//!     monitor.start();
//! }
//!
//! let _gate = AccessGate::new(Arc::clone(&controller));
//! # Ok(())
//! # }
//! ```

pub mod authority;
pub mod config;
pub mod controller;
pub mod gate;
pub mod monitor;
pub mod session;

#[cfg(test)]
pub(crate) mod test_util;

pub use authority::{AuthErrorCode, Authority, AuthorityError, HttpAuthority};
pub use config::SessionConfig;
pub use controller::AuthController;
pub use gate::{AccessGate, Screen, View};
pub use monitor::{ExpirationMonitor, SessionEvent};
pub use session::{AuthState, Session, SessionStore, UserProfile};
