//! Infrastructure implementation of the `AppShell` port.
//!
//! Entering the main view from the CLI means recording the session so later
//! invocations (`preboot session`) can see it.

use anyhow::{Context, Result};
use tracing::info;

use crate::application::ports::{AppShell, SessionStore};
use crate::domain::Session;
use crate::infra::state::SessionFile;

pub struct SessionShell {
    store: SessionFile,
}

impl SessionShell {
    #[must_use]
    pub fn new(store: SessionFile) -> Self {
        Self { store }
    }
}

impl AppShell for SessionShell {
    async fn enter_main_view(&self, session: &Session) -> Result<()> {
        self.store
            .save_async(session)
            .await
            .context("recording session")?;
        info!(mode = %session.mode, "main view entered");
        Ok(())
    }
}
