//! Runtime session guard.
//!
//! A session exists only after a successful launch and ends only on an
//! explicit stop. The guard is a cloneable handle owned by the composition
//! root; every clone observes the same session.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};

use crate::domain::error::SessionError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SessionMode {
    Local,
    Remote,
}

impl fmt::Display for SessionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Local => "local",
            Self::Remote => "remote",
        })
    }
}

/// Snapshot of the active session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Session {
    pub mode: SessionMode,
    pub session_id: Option<String>,
    pub runtime_id: Option<String>,
    pub started_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct SessionGuard {
    inner: Arc<Mutex<Option<Session>>>,
}

impl SessionGuard {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Guard pre-populated with a session restored from disk.
    #[must_use]
    pub fn restored(session: Option<Session>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(session)),
        }
    }

    fn slot(&self) -> MutexGuard<'_, Option<Session>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Start a session.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::AlreadyActive`] if a session is running.
    pub fn start(
        &self,
        mode: SessionMode,
        session_id: Option<String>,
        runtime_id: Option<String>,
    ) -> Result<Session, SessionError> {
        let mut slot = self.slot();
        if let Some(active) = slot.as_ref() {
            return Err(SessionError::AlreadyActive { mode: active.mode });
        }
        let session = Session {
            mode,
            session_id,
            runtime_id,
            started_at: chrono::Utc::now(),
        };
        *slot = Some(session.clone());
        Ok(session)
    }

    /// Stop the session, returning it if one was active. Never fails.
    pub fn stop(&self) -> Option<Session> {
        self.slot().take()
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.slot().is_some()
    }

    #[must_use]
    pub fn get(&self) -> Option<Session> {
        self.slot().clone()
    }

    /// # Errors
    ///
    /// Returns [`SessionError::NotActive`] when no session is running.
    pub fn assert_active(&self) -> Result<Session, SessionError> {
        self.get().ok_or(SessionError::NotActive)
    }

    /// # Errors
    ///
    /// Returns [`SessionError::AlreadyActive`] when a session is running.
    pub fn assert_inactive(&self) -> Result<(), SessionError> {
        match self.slot().as_ref() {
            Some(active) => Err(SessionError::AlreadyActive { mode: active.mode }),
            None => Ok(()),
        }
    }
}
