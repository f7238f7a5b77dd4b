//! Typed domain error enums.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All error types implement `thiserror::Error` and convert to `anyhow::Error`
//! via the `?` operator.

use preboot_common::UnknownVariant;
use thiserror::Error;

use crate::domain::session::SessionMode;

// ── Parse errors ──────────────────────────────────────────────────────────────

/// Malformed user-supplied values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error(transparent)]
    Vocabulary(#[from] UnknownVariant),

    #[error("Invalid {field}: '{value}' is not a positive number")]
    NotPositive { field: &'static str, value: String },
}

// ── Session errors ────────────────────────────────────────────────────────────

/// Session guard violations. These indicate a caller bug, not an
/// environmental condition.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("A {mode} session is already active. Stop it first: preboot session stop")]
    AlreadyActive { mode: SessionMode },

    #[error("No session is active. Launch one with: preboot launch")]
    NotActive,
}

// ── Flow errors ───────────────────────────────────────────────────────────────

/// Failures of preboot service exchanges that the flow must distinguish.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FlowError {
    #[error("Launch decision refused by the preboot service (HTTP {status}).")]
    DecideRejected { status: u16 },

    #[error("{endpoint} answered HTTP {status}.")]
    UnexpectedStatus { endpoint: String, status: u16 },

    #[error("No topology mode selected.")]
    NoModeSelected,
}

// ── Config errors ─────────────────────────────────────────────────────────────

/// Errors related to configuration key/value validation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Unknown setting: {key}\n\nValid settings: {valid}")]
    UnknownKey { key: String, valid: String },

    #[error("Invalid value for {key}: {value}\n\nValid values: {valid}")]
    InvalidValue {
        key: String,
        value: String,
        valid: String,
    },

    #[error("Preboot service base URL is not configured. Set service.base_url or PREBOOT_BASE_URL.")]
    MissingBaseUrl,

    #[error("Invalid preboot service base URL '{0}': must start with http:// or https://")]
    InvalidBaseUrl(String),
}
