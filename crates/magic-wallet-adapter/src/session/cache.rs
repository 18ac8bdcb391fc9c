/*
[INPUT]:  Login outcomes worth surviving a restart
[OUTPUT]: Best-effort persisted session hint
[POS]:    Session layer - file-backed session cache
[UPDATE]: When the persisted shape or storage location changes
*/

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

const DEFAULT_CACHE_PATH: &str = ".magic-wallet/session.json";

/// Persisted login hint. A hint only: the provider remains the authority
/// on whether the session is actually live.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CachedSession {
    pub logged_in: bool,
    #[serde(default)]
    pub token: Option<String>,
    pub saved_at: DateTime<Utc>,
}

/// File-backed session cache.
///
/// Every operation is best-effort: a missing or corrupt file reads as "no
/// hint", and write failures are logged and swallowed. Nothing in the
/// adapter depends on this surviving.
#[derive(Debug, Clone)]
pub struct SessionCache {
    path: PathBuf,
}

impl SessionCache {
    pub fn new() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_CACHE_PATH),
        }
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stored session hint, `None` when missing or unreadable
    pub fn load(&self) -> Option<CachedSession> {
        let raw = fs::read_to_string(&self.path).ok()?;
        match serde_json::from_str(&raw) {
            Ok(session) => Some(session),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "discarding corrupt session cache");
                None
            }
        }
    }

    /// Whether the cache claims a live session
    pub fn hint_logged_in(&self) -> bool {
        self.load().is_some_and(|session| session.logged_in)
    }

    /// Record a successful login
    pub fn remember_login(&self, token: Option<&str>) {
        let session = CachedSession {
            logged_in: true,
            token: token.map(str::to_string),
            saved_at: Utc::now(),
        };
        self.store(&session);
    }

    /// Persist a session hint, creating parent directories as needed
    pub fn store(&self, session: &CachedSession) {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                if let Err(e) = fs::create_dir_all(parent) {
                    warn!(path = %parent.display(), error = %e, "session cache directory unavailable");
                    return;
                }
            }
        }

        match serde_json::to_string_pretty(session) {
            Ok(raw) => {
                if let Err(e) = fs::write(&self.path, raw) {
                    warn!(path = %self.path.display(), error = %e, "session cache write failed");
                } else {
                    debug!(path = %self.path.display(), "session cache updated");
                }
            }
            Err(e) => warn!(error = %e, "session cache serialization failed"),
        }
    }

    /// Drop the stored hint, if any
    pub fn clear(&self) {
        match fs::remove_file(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "session cache cleared"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %self.path.display(), error = %e, "session cache removal failed"),
        }
    }
}

impl Default for SessionCache {
    fn default() -> Self {
        Self::new()
    }
}
