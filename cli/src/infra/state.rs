//! Infrastructure implementation of the `SessionStore` port.
//!
//! `SessionFile` provides async load/save using `tokio::task::spawn_blocking`
//! with atomic write (temp file + rename) to prevent state corruption.

use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::application::ports::SessionStore;
use crate::domain::Session;
use crate::infra::config::preboot_home;

/// Session file manager (`~/.preboot/session.json`).
#[derive(Debug, Clone)]
pub struct SessionFile {
    path: PathBuf,
}

impl SessionFile {
    /// Create a session file manager at the default path.
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined.
    pub fn new() -> Result<Self> {
        Ok(Self::with_path(preboot_home()?.join("session.json")))
    }

    /// Create a session file manager with an explicit path (used in tests).
    #[must_use]
    pub fn with_path(path: PathBuf) -> Self {
        Self { path }
    }

    fn load_sync(&self) -> Result<Option<Session>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("reading session file {}", self.path.display()))?;
        let session: Session = serde_json::from_str(&content)
            .with_context(|| format!("parsing session file {}", self.path.display()))?;
        Ok(Some(session))
    }

    fn save_sync(&self, session: &Session) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating directory {}", parent.display()))?;
        }
        let content = serde_json::to_string_pretty(session).context("serializing session")?;

        let temp_path = self.path.with_extension("json.tmp");
        std::fs::write(&temp_path, &content)
            .with_context(|| format!("writing temp file {}", temp_path.display()))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&temp_path, std::fs::Permissions::from_mode(0o600))
                .with_context(|| format!("setting permissions on {}", temp_path.display()))?;
        }

        std::fs::rename(&temp_path, &self.path)
            .with_context(|| format!("finalizing session file {}", self.path.display()))?;

        Ok(())
    }

    fn clear_sync(&self) -> Result<()> {
        if self.path.exists() {
            std::fs::remove_file(&self.path)
                .with_context(|| format!("removing session file {}", self.path.display()))?;
        }
        Ok(())
    }
}

impl SessionStore for SessionFile {
    async fn load_async(&self) -> Result<Option<Session>> {
        let file = self.clone();
        tokio::task::spawn_blocking(move || file.load_sync())
            .await
            .context("session load task panicked")?
    }

    async fn save_async(&self, session: &Session) -> Result<()> {
        let file = self.clone();
        let session = session.clone();
        tokio::task::spawn_blocking(move || file.save_sync(&session))
            .await
            .context("session save task panicked")?
    }

    async fn clear_async(&self) -> Result<()> {
        let file = self.clone();
        tokio::task::spawn_blocking(move || file.clear_sync())
            .await
            .context("session clear task panicked")?
    }
}
