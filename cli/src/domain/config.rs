//! Domain types and validators for preboot configuration.
//!
//! Pure functions only: no I/O, no async, no filesystem access.

use anyhow::Result;
use serde::{Deserialize, Serialize};

use preboot_common::endpoints::DEFAULT_BASE_URL;

use crate::domain::error::ConfigError;

// ── Constants ────────────────────────────────────────────────────────────────

pub const VALID_CONFIG_KEYS: &[&str] = &[
    "service.base_url",
    "service.request_timeout_secs",
    "ready.attempts",
    "ready.interval_ms",
    "runtime.id",
];

const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
const DEFAULT_READY_ATTEMPTS: u32 = 60;
const DEFAULT_READY_INTERVAL_MS: u64 = 500;

// ── Config schema ────────────────────────────────────────────────────────────

/// Top-level configuration stored in `~/.preboot/config.yaml`.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct PrebootConfig {
    pub service: ServiceConfig,
    pub ready: ReadyConfig,
    pub runtime: RuntimeConfig,
}

/// Where the preboot service lives.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ServiceConfig {
    pub base_url: String,
    /// Per-request timeout.
    pub request_timeout_secs: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

/// Readiness polling used by `preboot wait`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ReadyConfig {
    pub attempts: u32,
    pub interval_ms: u64,
}

impl Default for ReadyConfig {
    fn default() -> Self {
        Self {
            attempts: DEFAULT_READY_ATTEMPTS,
            interval_ms: DEFAULT_READY_INTERVAL_MS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Identifier of this runtime, recorded on every session.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl PrebootConfig {
    /// Set a whitelisted key from its string form.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value is invalid.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        validate_config_key(key)?;
        validate_config_value(key, value)?;
        match key {
            "service.base_url" => value.clone_into(&mut self.service.base_url),
            "service.request_timeout_secs" => {
                self.service.request_timeout_secs = parse_positive(key, value)?;
            }
            "ready.attempts" => {
                self.ready.attempts = u32::try_from(parse_positive(key, value)?)
                    .map_err(|_| invalid(key, value, "a positive integer"))?;
            }
            "ready.interval_ms" => self.ready.interval_ms = parse_positive(key, value)?,
            "runtime.id" => self.runtime.id = Some(value.to_string()),
            _ => {}
        }
        Ok(())
    }

    /// Current value of a whitelisted key, as shown by `config show`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<String> {
        match key {
            "service.base_url" => Some(self.service.base_url.clone()),
            "service.request_timeout_secs" => Some(self.service.request_timeout_secs.to_string()),
            "ready.attempts" => Some(self.ready.attempts.to_string()),
            "ready.interval_ms" => Some(self.ready.interval_ms.to_string()),
            "runtime.id" => self.runtime.id.clone(),
            _ => None,
        }
    }
}

// ── Validators ───────────────────────────────────────────────────────────────

/// Validates a configuration key against the whitelist.
///
/// # Errors
///
/// Returns an error if the key is not in the allowed list.
pub fn validate_config_key(key: &str) -> Result<()> {
    if !VALID_CONFIG_KEYS.contains(&key) {
        return Err(ConfigError::UnknownKey {
            key: key.to_string(),
            valid: VALID_CONFIG_KEYS.join(", "),
        }
        .into());
    }
    Ok(())
}

/// Validates a configuration value for the given key.
///
/// # Errors
///
/// Returns an error if the value is not valid for the key.
pub fn validate_config_value(key: &str, value: &str) -> Result<()> {
    match key {
        "service.base_url" => validate_base_url(value).map_err(Into::into),
        "service.request_timeout_secs" | "ready.attempts" | "ready.interval_ms" => {
            parse_positive(key, value)?;
            Ok(())
        }
        "runtime.id" if value.trim().is_empty() => {
            Err(invalid(key, value, "a non-empty identifier").into())
        }
        _ => Ok(()),
    }
}

/// Reject a missing or non-HTTP base URL.
///
/// # Errors
///
/// Returns [`ConfigError::MissingBaseUrl`] or [`ConfigError::InvalidBaseUrl`].
pub fn validate_base_url(url: &str) -> Result<(), ConfigError> {
    let url = url.trim();
    if url.is_empty() {
        return Err(ConfigError::MissingBaseUrl);
    }
    let rest = url
        .strip_prefix("http://")
        .or_else(|| url.strip_prefix("https://"))
        .ok_or_else(|| ConfigError::InvalidBaseUrl(url.to_string()))?;
    if rest.is_empty() || rest.starts_with('/') {
        return Err(ConfigError::InvalidBaseUrl(url.to_string()));
    }
    Ok(())
}

fn parse_positive(key: &str, value: &str) -> Result<u64, ConfigError> {
    value
        .trim()
        .parse::<u64>()
        .ok()
        .filter(|n| *n > 0)
        .ok_or_else(|| invalid(key, value, "a positive integer"))
}

fn invalid(key: &str, value: &str, valid: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
        valid: valid.to_string(),
    }
}

// ── Unit tests ───────────────────────────────────────────────────────────────
