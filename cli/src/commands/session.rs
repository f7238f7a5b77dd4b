//! `preboot session`: show or stop the persisted session.

use anyhow::Result;
use clap::Subcommand;
use std::process::ExitCode;

use crate::application::ports::SessionStore;
use crate::domain::SessionGuard;
use crate::output::{HumanRenderer, OutputContext, json};

#[derive(Subcommand, Clone, Copy, Default)]
pub enum SessionCommand {
    /// Show the active session
    #[default]
    Show,
    /// Stop the active session
    Stop,
}

/// Run `preboot session`.
///
/// # Errors
///
/// Returns an error if the session file cannot be read or removed.
pub async fn run(
    ctx: &OutputContext,
    json: bool,
    cmd: SessionCommand,
    store: &impl SessionStore,
) -> Result<ExitCode> {
    let guard = SessionGuard::restored(store.load_async().await?);

    match cmd {
        SessionCommand::Show => {
            let session = guard.get();
            if json {
                json::print(&serde_json::json!({
                    "active": session.is_some(),
                    "session": session,
                }))?;
            } else {
                HumanRenderer::new(ctx).render_session(session.as_ref());
            }
        }
        SessionCommand::Stop => {
            let stopped = guard.stop();
            store.clear_async().await?;
            if json {
                json::print(&serde_json::json!({
                    "stopped": stopped.is_some(),
                    "session": stopped,
                }))?;
            } else if let Some(session) = stopped {
                ctx.success(&format!("Stopped {} session.", session.mode));
            } else {
                ctx.info("No active session.");
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}
