//! Version command

use anyhow::Result;
use std::process::ExitCode;

use crate::output::{HumanRenderer, OutputContext, json};

/// Run the version command.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn run(ctx: &OutputContext, json: bool) -> Result<ExitCode> {
    let version = env!("CARGO_PKG_VERSION");

    if json {
        json::print(&serde_json::json!({ "version": version }))?;
    } else {
        HumanRenderer::new(ctx).render_version(version);
    }
    Ok(ExitCode::SUCCESS)
}
