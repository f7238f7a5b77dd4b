//! `preboot verify`: check this machine against the local policy.

use anyhow::Result;
use std::process::ExitCode;

use preboot_common::TopologyMode;

use crate::app::AppContext;
use crate::commands::with_spinner;
use crate::domain::{LOCAL_REQUIREMENTS, evaluate_local_runtime};
use crate::output::json;

/// Run `preboot verify`.
///
/// The runtime evaluation is advisory; only the policy verdict feeds the
/// launch gate.
///
/// # Errors
///
/// Returns an error if the verify exchange fails.
pub async fn run(app: &AppContext) -> Result<ExitCode> {
    let (flow, adapter) = app.engine();
    adapter.select_mode(TopologyMode::Local);
    let verdict = with_spinner(
        app,
        "verifying local system...",
        "local system verified",
        adapter.fetch_system_verify(),
    )
    .await?;

    // The verify endpoint answered, so a backend is reachable.
    let runtime = flow.context().local.profile.map(|mut profile| {
        profile.backend_available = true;
        evaluate_local_runtime(&profile, &LOCAL_REQUIREMENTS)
    });
    let ui = adapter.state();

    if app.is_json() {
        json::print(&serde_json::json!({
            "verdict": verdict,
            "summary": ui.local_summary,
            "gates": ui.gates,
            "runtime": runtime,
        }))?;
        return Ok(ExitCode::SUCCESS);
    }

    let renderer = app.renderer();
    if let Some(summary) = &ui.local_summary {
        renderer.render_local_summary(summary);
    }
    renderer.render_gates(ui.gates);
    if let Some(runtime) = &runtime {
        renderer.render_runtime_evaluation(runtime);
    }
    Ok(ExitCode::SUCCESS)
}
