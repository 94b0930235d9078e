use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::warn;

use super::Session;

/// Session file name in the storage directory.
const SESSION_FILE: &str = "session.json";

/// Durable storage for the single current session record.
///
/// Losing the record is equivalent to logout; a corrupt record is treated
/// as absent. Neither may fail startup.
pub struct SessionStore {
    dir: PathBuf,
}

impl SessionStore {
    /// Open a store rooted at `dir`, creating the directory if needed.
    pub fn open(dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create session directory {}", dir.display()))?;
        Ok(Self { dir })
    }

    /// Overwrite the stored record. The payload is written to a temp file
    /// and moved into place, so a reader never observes a half-written
    /// record.
    pub fn save(&self, session: &Session) -> Result<()> {
        let contents = serde_json::to_string_pretty(session)?;
        let tmp = self.dir.join(format!("{}.tmp", SESSION_FILE));
        fs::write(&tmp, contents)
            .with_context(|| format!("Failed to write session file {}", tmp.display()))?;
        fs::rename(&tmp, self.session_path()).context("Failed to replace session file")?;
        Ok(())
    }

    /// The last saved record, or `None` when nothing is stored or the
    /// stored payload does not parse. Corruption is absence, never an
    /// error.
    pub fn load(&self) -> Option<Session> {
        let path = self.session_path();
        if !path.exists() {
            return None;
        }

        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) => {
                warn!(error = %e, "Failed to read session file, treating as absent");
                return None;
            }
        };

        match serde_json::from_str(&contents) {
            Ok(session) => Some(session),
            Err(e) => {
                warn!(error = %e, "Stored session is unparsable, treating as absent");
                None
            }
        }
    }

    /// Remove the stored record. Clearing an already-empty store is not an
    /// error.
    pub fn clear(&self) -> Result<()> {
        let path = self.session_path();
        if path.exists() {
            fs::remove_file(&path).context("Failed to remove session file")?;
        }
        Ok(())
    }

    fn session_path(&self) -> PathBuf {
        self.dir.join(SESSION_FILE)
    }
}

// ============================================================================
// Tests
// ============================================================================
