//! `preboot status`: engine status and trusted peers.

use anyhow::Result;
use std::process::ExitCode;

use crate::app::AppContext;
use crate::commands::with_spinner;
use crate::output::json;

/// Run `preboot status`.
///
/// # Errors
///
/// Returns an error if the preboot service cannot be reached.
pub async fn run(app: &AppContext) -> Result<ExitCode> {
    let (flow, _adapter) = app.engine();
    with_spinner(
        app,
        "contacting preboot service...",
        "preboot service answered",
        flow.start_discovery(),
    )
    .await?;

    let ctx = flow.context();
    let session = app.session.get();

    if app.is_json() {
        json::print(&serde_json::json!({
            "engine": ctx.engine_status,
            "trusted": ctx.remote.trusted,
            "session": session,
        }))?;
        return Ok(ExitCode::SUCCESS);
    }

    let renderer = app.renderer();
    if let Some(status) = &ctx.engine_status {
        renderer.render_engine_status(status);
    }
    renderer.render_peers("Trusted peers:", &ctx.remote.trusted, None);
    println!();
    renderer.render_session(session.as_ref());
    Ok(ExitCode::SUCCESS)
}
