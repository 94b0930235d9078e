//! Expiration monitor: time-driven supervision of an authenticated
//! session.
//!
//! Purely reactive. The monitor owns nothing but its timer task and the
//! "warning currently shown" flag; the session itself stays with the
//! controller. The timer's lifecycle follows the session state, not any
//! UI surface: it is started when a session becomes current and dies as
//! soon as no session record remains.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use chrono::Utc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::config::SessionConfig;
use crate::controller::AuthController;
use crate::session::model::ceil_minutes;

/// Buffer size for the monitor event channel.
/// A session lifetime produces a handful of events; 16 leaves headroom
/// for a slow consumer.
const EVENT_CHANNEL_SIZE: usize = 16;

/// Notices emitted for the application shell to present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// The session entered the warning window. `minutes_left` is whole
    /// minutes, rounded up.
    ExpiryWarning { minutes_left: i64 },
    /// A previously raised warning is no longer relevant.
    WarningDismissed,
    /// The session ended involuntarily: hard expiry, or a failed
    /// revalidation after the user chose to continue.
    SessionEnded,
}

pub struct ExpirationMonitor {
    inner: Arc<Inner>,
    task: Mutex<Option<JoinHandle<()>>>,
}

struct Inner {
    controller: Arc<AuthController>,
    poll_interval: std::time::Duration,
    warning_window: chrono::Duration,
    events: mpsc::Sender<SessionEvent>,
    warning_active: AtomicBool,
}

impl ExpirationMonitor {
    /// Create a monitor and the receiving end of its event stream.
    pub fn new(
        controller: Arc<AuthController>,
        config: &SessionConfig,
    ) -> (Self, mpsc::Receiver<SessionEvent>) {
        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_SIZE);
        let warning_window = chrono::Duration::from_std(config.warning_window)
            .unwrap_or_else(|_| chrono::Duration::minutes(5));
        let inner = Arc::new(Inner {
            controller,
            poll_interval: config.poll_interval,
            warning_window,
            events: tx,
            warning_active: AtomicBool::new(false),
        });
        (
            Self {
                inner,
                task: Mutex::new(None),
            },
            rx,
        )
    }

    /// Start the periodic check. Idempotent while a check is running; the
    /// task exits on its own as soon as no session record remains.
    pub fn start(&self) {
        let mut task = self.task.lock().expect("monitor task lock poisoned");
        if task.as_ref().is_some_and(|t| !t.is_finished()) {
            return;
        }
        let inner = Arc::clone(&self.inner);
        *task = Some(tokio::spawn(inner.run()));
    }

    /// Cancel the periodic check and drop any active warning. Harmless if
    /// the task already exited.
    pub fn stop(&self) {
        if let Some(task) = self.task.lock().expect("monitor task lock poisoned").take() {
            task.abort();
        }
        self.inner.clear_warning();
    }

    /// Whether a warning is currently being shown.
    pub fn warning_active(&self) -> bool {
        self.inner.warning_active.load(Ordering::SeqCst)
    }

    /// The user chose to keep working: revalidate the session remotely.
    /// A positive answer dismisses the warning; anything else ends the
    /// session exactly as hard expiry does.
    pub async fn continue_session(&self) -> bool {
        if self.inner.controller.validate_session().await {
            self.inner.clear_warning();
            true
        } else {
            self.inner.clear_warning();
            self.inner.controller.expire_locally();
            self.inner.send(SessionEvent::SessionEnded);
            false
        }
    }

    /// The user chose to log out from the warning dialog.
    pub fn logout(&self) {
        self.inner.clear_warning();
        self.inner.controller.logout();
    }
}

impl Drop for ExpirationMonitor {
    fn drop(&mut self) {
        if let Ok(mut task) = self.task.lock() {
            if let Some(task) = task.take() {
                task.abort();
            }
        }
    }
}

impl Inner {
    async fn run(self: Arc<Self>) {
        let mut interval = tokio::time::interval(self.poll_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        debug!("Expiration monitor started");
        loop {
            interval.tick().await;
            if !self.check_now() {
                break;
            }
        }
        debug!("Expiration monitor stopped");
    }

    /// One poll. Hard expiry is evaluated before the warning window, so a
    /// session past its deadline never produces a warning. Returns `false`
    /// once no session remains and the timer should die.
    fn check_now(&self) -> bool {
        let Some(expires_at) = self.controller.expires_at() else {
            return false;
        };

        let remaining = expires_at - Utc::now();
        if remaining <= chrono::Duration::zero() {
            self.clear_warning();
            self.controller.expire_locally();
            self.send(SessionEvent::SessionEnded);
            info!("Session hard-expired");
            return false;
        }

        if remaining <= self.warning_window
            && !self.warning_active.swap(true, Ordering::SeqCst)
        {
            let minutes_left = ceil_minutes(remaining);
            debug!(minutes_left, "Session expiring soon");
            self.send(SessionEvent::ExpiryWarning { minutes_left });
        }

        true
    }

    fn clear_warning(&self) {
        if self.warning_active.swap(false, Ordering::SeqCst) {
            self.send(SessionEvent::WarningDismissed);
        }
    }

    /// The timer must never block on a slow consumer; a full channel just
    /// drops the event.
    fn send(&self, event: SessionEvent) {
        if self.events.try_send(event).is_err() {
            debug!(?event, "Dropping session event, receiver not keeping up");
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
