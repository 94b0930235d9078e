//! Access gate: the single decision point for what a requested view
//! resolves to under the current authentication state.
//!
//! No other component renders protected content. The shell asks the gate
//! for every view change and renders exactly what it is told.

use std::sync::Arc;

use crate::controller::AuthController;
use crate::session::AuthState;

/// Application views the shell can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Dashboard,
    Clients,
    Equipment,
    WorkOrders,
    Quotations,
    Reports,
    Settings,
    /// The password-recovery flow, reachable without a session.
    PasswordReset,
}

/// What the shell should render for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    /// Startup restore still running: a neutral loading indicator and
    /// nothing else.
    Loading,
    Login,
    PasswordReset,
    /// Render the requested application content.
    Content(View),
}

pub struct AccessGate {
    controller: Arc<AuthController>,
}

impl AccessGate {
    pub fn new(controller: Arc<AuthController>) -> Self {
        Self { controller }
    }

    /// Resolve a requested view against the current state.
    ///
    /// The requested view is not remembered across a login redirect; after
    /// authentication the shell lands on whatever it requests next. The
    /// gate stays stateless.
    pub fn resolve(&self, requested: View) -> Screen {
        match self.controller.state() {
            AuthState::Initializing => Screen::Loading,
            AuthState::Unauthenticated if requested == View::PasswordReset => Screen::PasswordReset,
            AuthState::Unauthenticated => Screen::Login,
            AuthState::Authenticated => Screen::Content(requested),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::{authenticated_controller, controller_with, session_expiring_in, MockAuthority};

    #[tokio::test]
    async fn test_initializing_renders_loading_only() {
        let (controller, _store) = controller_with(MockAuthority::new());
        let gate = AccessGate::new(controller);

        assert_eq!(gate.resolve(View::Dashboard), Screen::Loading);
        assert_eq!(gate.resolve(View::PasswordReset), Screen::Loading);
    }

    #[tokio::test]
    async fn test_unauthenticated_redirects_to_login() {
        let (controller, _store) = controller_with(MockAuthority::new());
        controller.restore_from_store().await;
        let gate = AccessGate::new(controller);

        // Whatever was asked for, an unauthenticated user sees login.
        assert_eq!(gate.resolve(View::Dashboard), Screen::Login);
        assert_eq!(gate.resolve(View::WorkOrders), Screen::Login);
        assert_eq!(gate.resolve(View::Settings), Screen::Login);
    }

    #[tokio::test]
    async fn test_unauthenticated_password_reset_is_reachable() {
        let (controller, _store) = controller_with(MockAuthority::new());
        controller.restore_from_store().await;
        let gate = AccessGate::new(controller);

        assert_eq!(gate.resolve(View::PasswordReset), Screen::PasswordReset);
    }

    #[tokio::test]
    async fn test_authenticated_renders_requested_content() {
        let (controller, _authority, _store) =
            authenticated_controller(session_expiring_in(3600)).await;
        let gate = AccessGate::new(controller);

        assert_eq!(gate.resolve(View::Quotations), Screen::Content(View::Quotations));
    }

    #[tokio::test]
    async fn test_expired_session_is_gated_like_logout() {
        let (controller, _authority, _store) =
            authenticated_controller(session_expiring_in(-1)).await;
        let gate = AccessGate::new(controller);

        // The record is still in memory but past its deadline; the gate
        // must not show protected content for it.
        assert_eq!(gate.resolve(View::Dashboard), Screen::Login);
    }
}
