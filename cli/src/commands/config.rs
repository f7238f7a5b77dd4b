//! `preboot config`: show and set configuration values.

use anyhow::Result;
use clap::Subcommand;
use std::process::ExitCode;

use crate::application::ports::ConfigStore;
use crate::application::services::config_service;
use crate::output::{HumanRenderer, OutputContext, json};

/// Config subcommands.
#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show,
    /// Set configuration value
    Set {
        /// Configuration key
        key: String,
        /// Configuration value
        value: String,
    },
    /// Print the configuration file location
    Path,
}

/// Run the config command.
///
/// # Errors
///
/// Returns an error if the key or value is invalid or the file cannot be
/// read or written.
pub fn run(
    ctx: &OutputContext,
    json: bool,
    cmd: ConfigCommand,
    store: &impl ConfigStore,
) -> Result<ExitCode> {
    match cmd {
        ConfigCommand::Show => {
            let config = config_service::load_config(store)?;
            if json {
                json::print(&config)?;
            } else {
                HumanRenderer::new(ctx).render_config(&config, &store.path()?);
            }
        }
        ConfigCommand::Set { key, value } => {
            config_service::set_config_value(store, &key, &value)?;
            if json {
                json::print(&serde_json::json!({ "key": key, "value": value }))?;
            } else {
                ctx.success(&format!("Set {key} = {value}"));
            }
        }
        ConfigCommand::Path => {
            let path = store.path()?;
            if json {
                json::print(&serde_json::json!({ "path": path }))?;
            } else {
                println!("{}", path.display());
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}
