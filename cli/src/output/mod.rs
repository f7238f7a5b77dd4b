//! Terminal presentation: styling, renderers, progress and JSON envelopes.

pub mod human;
pub mod json;
pub mod progress;
pub mod reporter;
pub mod styles;

use console::Term;
use owo_colors::{OwoColorize as _, Style};

use crate::domain::PolicyStatus;

pub use human::HumanRenderer;
pub use reporter::TerminalReporter;
pub use styles::Styles;

/// Styling and terminal state shared by every renderer.
pub struct OutputContext {
    pub styles: Styles,
    pub is_tty: bool,
    /// Suppress everything except errors.
    pub quiet: bool,
}

impl OutputContext {
    /// Colors need a terminal, no `--no-color`, and no non-empty `NO_COLOR`.
    #[must_use]
    pub fn new(no_color: bool, quiet: bool) -> Self {
        let is_tty = Term::stdout().is_term();
        let env_no_color = std::env::var_os("NO_COLOR").is_some_and(|v| !v.is_empty());

        let mut styles = Styles::default();
        if is_tty && !no_color && !env_no_color {
            styles.colorize();
        }
        Self {
            styles,
            is_tty,
            quiet,
        }
    }

    /// Spinners only make sense on an interactive terminal.
    #[must_use]
    pub fn show_progress(&self) -> bool {
        self.is_tty && !self.quiet
    }

    fn line(&self, glyph: &str, style: Style, msg: &str) {
        if !self.quiet {
            println!("  {} {msg}", glyph.style(style));
        }
    }

    pub fn success(&self, msg: &str) {
        self.line("✓", self.styles.success, msg);
    }

    pub fn warn(&self, msg: &str) {
        self.line("⚠", self.styles.warning, msg);
    }

    /// Goes to stderr and ignores `quiet`.
    pub fn error(&self, msg: &str) {
        eprintln!("  {} {msg}", "✗".style(self.styles.error));
    }

    pub fn info(&self, msg: &str) {
        self.line("ℹ", self.styles.info, msg);
    }

    pub fn header(&self, msg: &str) {
        if !self.quiet {
            println!("  {}", msg.style(self.styles.header));
        }
    }

    /// Key column is dimmed and padded so values line up.
    pub fn kv(&self, key: &str, value: &str) {
        if !self.quiet {
            println!("  {:<14}{value}", key.style(self.styles.dim));
        }
    }

    /// `APPROVED`, `LIMITED` or `BLOCKED` in its verdict style.
    #[must_use]
    pub fn verdict_badge(&self, status: PolicyStatus) -> String {
        status.as_str().style(self.styles.verdict(status)).to_string()
    }

    /// `ready` or `not ready` in its readiness style.
    #[must_use]
    pub fn readiness(&self, ready: bool) -> String {
        let word = if ready { "ready" } else { "not ready" };
        word.style(self.styles.readiness(ready)).to_string()
    }
}
