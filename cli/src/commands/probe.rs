//! `preboot probe`: probe one peer.

use anyhow::Result;
use clap::Args;
use std::process::ExitCode;

use crate::app::AppContext;
use crate::commands::with_spinner;
use crate::output::json;

#[derive(Args)]
pub struct ProbeArgs {
    /// Peer address or identity
    pub target: String,
}

/// Run `preboot probe`. Exits non-zero when the peer is unknown.
///
/// # Errors
///
/// Returns an error if the probe exchange fails.
pub async fn run(app: &AppContext, args: &ProbeArgs) -> Result<ExitCode> {
    let (flow, _adapter) = app.engine();
    let peer = with_spinner(
        app,
        &format!("probing {}...", args.target),
        "probe answered",
        flow.probe_remote_target(&args.target),
    )
    .await?;

    if app.is_json() {
        json::print(&serde_json::json!({
            "target": args.target,
            "found": peer.is_some(),
            "host": peer,
        }))?;
    } else if let Some(peer) = &peer {
        app.renderer().render_peer(peer);
    } else {
        app.output.warn(&format!("Peer not found: {}", args.target));
    }

    Ok(if peer.is_some() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
