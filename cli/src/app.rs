//! Application context: unified state passed to every command handler.
//!
//! `AppContext` is the composition root: it resolves configuration, builds
//! the HTTP client, restores the persisted session and hands out the
//! bootstrap flow. Commands receive `&AppContext` and nothing else.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::application::ports::{ConfigStore, SessionStore};
use crate::application::services::{BootstrapFlow, UiAdapter};
use crate::domain::{PrebootConfig, SessionGuard};
use crate::infra::config::YamlConfigStore;
use crate::infra::http::HttpPrebootApi;
use crate::infra::shell::SessionShell;
use crate::infra::state::SessionFile;
use crate::output::{HumanRenderer, OutputContext, TerminalReporter};

/// Environment variable overriding `runtime.id`.
pub const RUNTIME_ID_ENV: &str = "PREBOOT_RUNTIME_ID";

/// The flow as wired against the real service.
pub type Flow = BootstrapFlow<HttpPrebootApi, SessionShell>;
/// The adapter as wired against the real service.
pub type Adapter = UiAdapter<HttpPrebootApi, SessionShell>;

/// Output rendering mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-readable terminal output (default).
    Human,
    /// Machine-readable JSON output.
    Json,
}

/// Output rendering flags.
pub struct OutputFlags {
    /// Disable ANSI color output.
    pub no_color: bool,
    /// Suppress non-error output.
    pub quiet: bool,
    /// Enable JSON output mode.
    pub json: bool,
}

/// Behaviour flags.
pub struct BehaviourFlags {
    /// Skip interactive prompts (also set by `CI` / `PREBOOT_YES` env vars).
    pub yes: bool,
}

/// Service flags.
pub struct ServiceFlags {
    /// Base URL override (`--base-url` / `PREBOOT_BASE_URL`).
    pub base_url: Option<String>,
}

/// Flags passed from the top-level CLI to `AppContext::new`.
pub struct AppFlags {
    pub output: OutputFlags,
    pub behaviour: BehaviourFlags,
    pub service: ServiceFlags,
}

/// Unified application context passed to every command handler.
pub struct AppContext {
    /// Terminal output context (colors, quiet mode).
    pub output: OutputContext,
    /// Output rendering mode (human vs JSON).
    pub mode: OutputMode,
    /// Effective configuration: file, then environment and flag overrides.
    pub config: PrebootConfig,
    pub config_store: YamlConfigStore,
    pub api: Arc<HttpPrebootApi>,
    pub session_file: SessionFile,
    /// Session restored from disk at startup. Shared with every flow built
    /// by [`AppContext::engine`].
    pub session: SessionGuard,
    /// When `true`, skip interactive prompts and use defaults.
    ///
    /// Set when `--yes` / `-y` is passed, or when the `CI` or `PREBOOT_YES`
    /// environment variables are present.
    pub non_interactive: bool,
}

impl AppContext {
    /// Construct an `AppContext` from top-level CLI flags.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be loaded, the base URL
    /// is invalid, or the persisted session cannot be read.
    pub async fn new(flags: &AppFlags) -> Result<Self> {
        let ci_env = std::env::var("CI").is_ok() || std::env::var("PREBOOT_YES").is_ok();
        let non_interactive = flags.behaviour.yes || ci_env;

        let mode = if flags.output.json {
            OutputMode::Json
        } else {
            OutputMode::Human
        };

        let config_store = YamlConfigStore;
        let mut config = config_store.load().context("loading configuration")?;
        if let Some(url) = flags.service.base_url.as_deref().filter(|u| !u.is_empty()) {
            url.clone_into(&mut config.service.base_url);
        }
        if let Ok(id) = std::env::var(RUNTIME_ID_ENV)
            && !id.is_empty()
        {
            config.runtime.id = Some(id);
        }

        let api = HttpPrebootApi::new(
            &config.service.base_url,
            Duration::from_secs(config.service.request_timeout_secs),
        )?;

        let session_file = SessionFile::new()?;
        let restored = session_file
            .load_async()
            .await
            .context("restoring session")?;

        Ok(Self {
            output: OutputContext::new(flags.output.no_color, flags.output.quiet),
            mode,
            config,
            config_store,
            api: Arc::new(api),
            session_file,
            session: SessionGuard::restored(restored),
            non_interactive,
        })
    }

    /// Returns `true` when JSON output mode is active.
    #[must_use]
    pub fn is_json(&self) -> bool {
        self.mode == OutputMode::Json
    }

    #[must_use]
    pub fn renderer(&self) -> HumanRenderer<'_> {
        HumanRenderer::new(&self.output)
    }

    #[must_use]
    pub fn terminal_reporter(&self) -> TerminalReporter<'_> {
        TerminalReporter::new(&self.output)
    }

    /// Build a bootstrap flow and its UI adapter over the shared session.
    #[must_use]
    pub fn engine(&self) -> (Arc<Flow>, Adapter) {
        let flow = Arc::new(BootstrapFlow::new(
            Arc::clone(&self.api),
            SessionShell::new(self.session_file.clone()),
            self.session.clone(),
            self.config.runtime.id.clone(),
        ));
        let adapter = UiAdapter::new(Arc::clone(&flow));
        (flow, adapter)
    }

    /// Ask the user for confirmation.
    ///
    /// When `non_interactive` is `true` (CI, `--yes` flag, or `PREBOOT_YES`
    /// env), returns `default` immediately without prompting.
    ///
    /// # Errors
    ///
    /// Returns an error if the terminal prompt fails (e.g. no TTY available).
    pub fn confirm(&self, prompt: &str, default: bool) -> Result<bool> {
        if self.non_interactive {
            return Ok(default);
        }
        let confirmed = dialoguer::Confirm::new()
            .with_prompt(prompt)
            .default(default)
            .interact()?;
        Ok(confirmed)
    }

    /// Ask the user to pick one of `items`. `None` when non-interactive.
    ///
    /// # Errors
    ///
    /// Returns an error if the terminal prompt fails.
    pub fn select(&self, prompt: &str, items: &[String]) -> Result<Option<usize>> {
        if self.non_interactive || items.is_empty() {
            return Ok(None);
        }
        let picked = dialoguer::Select::new()
            .with_prompt(prompt)
            .items(items)
            .default(0)
            .interact_opt()?;
        Ok(picked)
    }
}
