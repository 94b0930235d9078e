//! Tunables for the session lifecycle core.
//!
//! The warning window and the monitor poll interval are the only
//! externally tunable behaviors; everything else carries a fixed, safe
//! default. A misconfigured value is clamped, never fatal.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use tracing::warn;

/// Application name used for the session storage directory path.
const APP_NAME: &str = "shopdesk";

/// Default interval between expiry checks.
/// Must stay well inside the warning window so expiry is caught with
/// bounded lateness.
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);

/// Default lead time before hard expiry during which the user is warned.
const DEFAULT_WARNING_WINDOW: Duration = Duration::from_secs(5 * 60);

/// HTTP request timeout for authority calls.
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// How often the expiration monitor re-checks the session deadline.
    pub poll_interval: Duration,
    /// Lead time before hard expiry during which the user is warned.
    pub warning_window: Duration,
    /// Timeout for outbound authority calls.
    pub request_timeout: Duration,
    /// Directory holding the persisted session record. `None` resolves to
    /// the platform data directory.
    pub storage_dir: Option<PathBuf>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            warning_window: DEFAULT_WARNING_WINDOW,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            storage_dir: None,
        }
    }
}

impl SessionConfig {
    /// Clamp out-of-range values so the config is safe to use.
    ///
    /// Rules:
    /// - a zero `poll_interval` or `warning_window` falls back to its
    ///   default
    /// - `poll_interval` is forced below `warning_window`, otherwise a
    ///   whole warning window could pass between two checks
    pub fn validated(mut self) -> Self {
        if self.poll_interval.is_zero() {
            warn!("poll_interval of zero, using default");
            self.poll_interval = DEFAULT_POLL_INTERVAL;
        }
        if self.warning_window.is_zero() {
            warn!("warning_window of zero, using default");
            self.warning_window = DEFAULT_WARNING_WINDOW;
        }
        if self.poll_interval >= self.warning_window {
            let clamped = (self.warning_window / 10).max(Duration::from_secs(1));
            warn!(
                poll_secs = self.poll_interval.as_secs(),
                window_secs = self.warning_window.as_secs(),
                "poll_interval does not fit inside warning_window, clamping"
            );
            self.poll_interval = clamped;
        }
        self
    }

    /// Directory for the persisted session record.
    pub fn session_dir(&self) -> Result<PathBuf> {
        if let Some(ref dir) = self.storage_dir {
            return Ok(dir.clone());
        }
        let data_dir =
            dirs::data_dir().ok_or_else(|| anyhow::anyhow!("Could not find data directory"))?;
        Ok(data_dir.join(APP_NAME))
    }
}

// ============================================================================
// Tests
// ============================================================================
