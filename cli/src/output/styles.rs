//! Stylesheet for preboot terminal output.
//!
//! Everything is plain until [`Styles::colorize`] runs. Verdicts and peer
//! readiness get their own entries so renderers ask for a domain state, not
//! a color.

use owo_colors::Style;

use crate::domain::PolicyStatus;

#[derive(Default, Clone)]
pub struct Styles {
    pub success: Style,
    pub warning: Style,
    pub error: Style,
    pub info: Style,
    pub dim: Style,
    pub bold: Style,
    pub header: Style,
    /// Marker in front of the selected peer
    pub selected: Style,
    pub approved: Style,
    pub limited: Style,
    pub blocked: Style,
    /// Peer readiness column
    pub ready: Style,
    pub not_ready: Style,
}

impl Styles {
    pub fn colorize(&mut self) {
        *self = Self {
            success: Style::new().green(),
            warning: Style::new().yellow(),
            error: Style::new().red(),
            info: Style::new().blue(),
            dim: Style::new().dimmed(),
            bold: Style::new().bold(),
            header: Style::new().bold().cyan(),
            selected: Style::new().bold().magenta(),
            approved: Style::new().bold().green(),
            limited: Style::new().bold().yellow(),
            blocked: Style::new().bold().red(),
            ready: Style::new().green(),
            not_ready: Style::new().dimmed(),
        };
    }

    /// Badge style for a local verdict.
    #[must_use]
    pub fn verdict(&self, status: PolicyStatus) -> Style {
        match status {
            PolicyStatus::Approved => self.approved,
            PolicyStatus::Limited => self.limited,
            PolicyStatus::Blocked => self.blocked,
        }
    }

    #[must_use]
    pub fn readiness(&self, ready: bool) -> Style {
        if ready { self.ready } else { self.not_ready }
    }
}
