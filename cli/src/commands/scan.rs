//! `preboot scan`: scan the LAN and list every known peer.

use anyhow::Result;
use std::process::ExitCode;

use preboot_common::TopologyMode;

use crate::app::AppContext;
use crate::commands::with_spinner;
use crate::output::json;

/// Run `preboot scan`.
///
/// # Errors
///
/// Returns an error if the preboot service cannot be reached. A failed scan
/// itself only yields an empty result.
pub async fn run(app: &AppContext) -> Result<ExitCode> {
    let (flow, adapter) = app.engine();
    flow.start_discovery().await?;
    adapter.select_mode(TopologyMode::Remote);

    let found = with_spinner(app, "scanning LAN...", "scan finished", async {
        Ok(adapter.refresh_scan().await)
    })
    .await?;
    let ui = adapter.state();

    if app.is_json() {
        json::print(&serde_json::json!({
            "found": found.len(),
            "hosts": ui.discovery.hosts,
        }))?;
        return Ok(ExitCode::SUCCESS);
    }

    app.renderer()
        .render_peers("Peers:", &ui.discovery.hosts, None);
    println!();
    app.output
        .info(&format!("{} peer(s) answered the scan.", found.len()));
    Ok(ExitCode::SUCCESS)
}
