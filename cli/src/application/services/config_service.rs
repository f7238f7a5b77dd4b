//! Application service: configuration use-cases.

use anyhow::Result;

use crate::application::ports::ConfigStore;
use crate::domain::config::PrebootConfig;

/// Load configuration.
///
/// # Errors
///
/// Returns an error if the stored configuration cannot be read.
pub fn load_config(store: &impl ConfigStore) -> Result<PrebootConfig> {
    store.load()
}

/// Validate and apply one setting, then persist the configuration.
///
/// # Errors
///
/// Returns an error if the key or value is invalid or the file cannot be
/// written. Nothing is written on validation failure.
pub fn set_config_value(store: &impl ConfigStore, key: &str, value: &str) -> Result<PrebootConfig> {
    let mut config = store.load()?;
    config.set(key, value)?;
    store.save(&config)?;
    Ok(config)
}
