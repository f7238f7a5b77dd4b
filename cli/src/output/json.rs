//! JSON output helpers.
//!
//! Every `--json` code path prints one pretty-printed document on stdout.
//! Failures use the error object produced by [`format_error`].

use anyhow::{Context, Result};
use serde::Serialize;

use crate::domain::{ConfigError, FlowError, ParseError, SessionError};

/// Format a JSON error object.
///
/// Output (pretty-printed):
/// ```json
/// {
///   "error": true,
///   "message": "...",
///   "code": "..."
/// }
/// ```
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn format_error(message: &str, code: &str) -> Result<String> {
    let obj = serde_json::json!({
        "error": true,
        "message": message,
        "code": code,
    });
    serde_json::to_string_pretty(&obj).context("JSON serialization failed")
}

/// Print any serializable value as pretty JSON on stdout.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn print<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(value).context("JSON serialization failed")?
    );
    Ok(())
}

/// Stable machine-readable code for a command failure.
#[must_use]
pub fn error_code(err: &anyhow::Error) -> &'static str {
    for cause in err.chain() {
        if let Some(e) = cause.downcast_ref::<FlowError>() {
            return match e {
                FlowError::DecideRejected { .. } => "DECIDE_REJECTED",
                FlowError::UnexpectedStatus { .. } => "SERVICE_ERROR",
                FlowError::NoModeSelected => "NO_MODE_SELECTED",
            };
        }
        if cause.is::<SessionError>() {
            return "SESSION_ERROR";
        }
        if cause.is::<ConfigError>() {
            return "CONFIG_ERROR";
        }
        if cause.is::<ParseError>() {
            return "INVALID_INPUT";
        }
        if cause.is::<reqwest::Error>() {
            return "SERVICE_UNREACHABLE";
        }
    }
    "ERROR"
}
