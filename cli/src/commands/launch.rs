//! `preboot launch`: choose where to run and start the session.

use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Result, bail};
use clap::Args;

use preboot_common::{ExecutionBackend, TopologyMode};

use crate::app::{Adapter, AppContext};
use crate::application::services::ConfirmOutcome;
use crate::commands::with_spinner;
use crate::domain::context::LlmResources;
use crate::domain::error::{FlowError, ParseError};
use crate::domain::{OpState, PeerRecord, ResourcesPatch, UiState};
use crate::output::json;

/// How long detached calls may run before the process exits.
const BACKGROUND_GRACE: Duration = Duration::from_secs(2);

#[derive(Args, Default)]
pub struct LaunchArgs {
    /// Where to run: local or remote
    #[arg(long, value_enum)]
    pub mode: Option<TopologyMode>,

    /// Peer to run on (id, hostname or address). Remote mode only
    #[arg(long)]
    pub host: Option<String>,

    /// Execution backend for a remote peer
    #[arg(long, value_enum)]
    pub backend: Option<ExecutionBackend>,

    /// VRAM to reserve for the model, in GB
    #[arg(long, value_parser = parse_vram_gb)]
    pub vram_gb: Option<f64>,
}

/// Parse a strictly positive, finite VRAM amount.
///
/// # Errors
///
/// Returns an error if the value is not a positive number.
pub fn parse_vram_gb(raw: &str) -> Result<f64, ParseError> {
    let invalid = || ParseError::NotPositive {
        field: "vram-gb",
        value: raw.to_string(),
    };
    let value: f64 = raw.trim().parse().map_err(|_| invalid())?;
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(invalid())
    }
}

/// Run `preboot launch`.
///
/// # Errors
///
/// Returns an error if a session is already active, the service cannot be
/// reached, no mode or host could be chosen, or local verification fails.
/// A refused or failed launch exits non-zero without an error.
pub async fn run(app: &AppContext, args: &LaunchArgs) -> Result<ExitCode> {
    app.session.assert_inactive()?;

    let (flow, adapter) = app.engine();
    with_spinner(
        app,
        "contacting preboot service...",
        "preboot service answered",
        flow.start_discovery(),
    )
    .await?;

    let mode = choose_mode(app, args.mode)?;
    adapter.select_mode(mode);

    match mode {
        TopologyMode::Local => {
            with_spinner(
                app,
                "verifying local system...",
                "local system verified",
                adapter.fetch_system_verify(),
            )
            .await?;
            if !app.is_json()
                && let Some(summary) = &adapter.state().local_summary
            {
                app.renderer().render_local_summary(summary);
            }
        }
        TopologyMode::Remote => {
            with_spinner(app, "scanning LAN...", "scan finished", async {
                Ok(adapter.refresh_scan().await)
            })
            .await?;
            let peer = choose_host(app, &adapter.state(), args.host.as_deref())?;
            let name = peer.display_name().to_string();
            with_spinner(app, &format!("probing {name}..."), "probe finished", async {
                adapter.select_host(peer).await;
                Ok(())
            })
            .await?;
        }
        TopologyMode::Cloud => {}
    }

    if let Some(backend) = args.backend {
        if adapter.state().gates.can_configure_execution {
            adapter.set_execution_backend(backend);
        } else {
            app.output
                .warn(&format!("Ignoring --backend {backend}: no ready peer selected."));
        }
    }
    if let Some(vram_gb) = args.vram_gb {
        adapter.set_resources(ResourcesPatch {
            llm: Some(LlmResources { vram_gb }),
            ..ResourcesPatch::default()
        });
    }

    let ui = adapter.state();
    if !ui.gates.can_launch {
        return refuse(app, &ui);
    }
    if !app.confirm(&format!("Launch a {mode} session?"), true)? {
        app.output.info("Launch cancelled.");
        return Ok(ExitCode::SUCCESS);
    }

    let outcome = with_spinner(app, "launching...", "launch finished", async {
        Ok(adapter.confirm_preboot().await)
    })
    .await?;
    flow.settle_background(BACKGROUND_GRACE).await;

    report(app, &adapter, &outcome)
}

fn choose_mode(app: &AppContext, requested: Option<TopologyMode>) -> Result<TopologyMode> {
    if let Some(mode) = requested {
        return Ok(mode);
    }
    let choices = [TopologyMode::Local, TopologyMode::Remote];
    let labels: Vec<String> = choices.iter().map(ToString::to_string).collect();
    match app.select("Where should the workload run?", &labels)? {
        Some(index) => Ok(choices[index]),
        None => Err(FlowError::NoModeSelected.into()),
    }
}

fn choose_host(app: &AppContext, ui: &UiState, wanted: Option<&str>) -> Result<PeerRecord> {
    let hosts = &ui.discovery.hosts;
    if let Some(wanted) = wanted {
        return match find_host(hosts, wanted) {
            Some(peer) => Ok(peer.clone()),
            None => bail!("Peer not found: {wanted}"),
        };
    }
    if hosts.is_empty() {
        bail!("No peers found. Pass --host or run: preboot scan");
    }
    let labels: Vec<String> = hosts
        .iter()
        .map(crate::output::human::format_peer_line)
        .collect();
    match app.select("Which peer?", &labels)? {
        Some(index) => Ok(hosts[index].clone()),
        None => bail!("No peer selected. Pass --host <id|hostname|address>"),
    }
}

/// Match by identity first, then hostname, then address.
#[must_use]
pub fn find_host<'a>(hosts: &'a [PeerRecord], wanted: &str) -> Option<&'a PeerRecord> {
    hosts
        .iter()
        .find(|p| p.id == wanted)
        .or_else(|| hosts.iter().find(|p| p.hostname.as_deref() == Some(wanted)))
        .or_else(|| hosts.iter().find(|p| p.address.as_deref() == Some(wanted)))
}

fn refuse(app: &AppContext, ui: &UiState) -> Result<ExitCode> {
    let reason = refusal_reason(ui);
    if app.is_json() {
        json::print(&serde_json::json!({
            "state": "REFUSED",
            "reason": reason,
            "ui": ui,
        }))?;
    } else {
        app.output.error(&format!("Launch refused: {reason}"));
    }
    Ok(ExitCode::FAILURE)
}

/// Why the launch gate is closed, in words.
#[must_use]
pub fn refusal_reason(ui: &UiState) -> String {
    match ui.mode {
        Some(TopologyMode::Local) => match &ui.local_summary {
            Some(summary) if !summary.reasons.is_empty() => summary.reasons.join(" "),
            Some(_) => "local runtime is blocked.".to_string(),
            None => "local system not verified.".to_string(),
        },
        Some(TopologyMode::Remote) => match &ui.selected_host {
            Some(peer) => format!("{} is offline or has no free resources.", peer.display_name()),
            None => "no peer selected.".to_string(),
        },
        Some(TopologyMode::Cloud) => "cloud execution is not available.".to_string(),
        None => "no mode selected.".to_string(),
    }
}

fn report(app: &AppContext, adapter: &Adapter, outcome: &ConfirmOutcome) -> Result<ExitCode> {
    let ui = adapter.state();
    let session = app.session.get();
    let state = match outcome {
        ConfirmOutcome::Refused => "REFUSED",
        ConfirmOutcome::Finished(op) => op.as_str(),
    };
    let ok = *outcome == ConfirmOutcome::Finished(OpState::Ready);

    if app.is_json() {
        json::print(&serde_json::json!({
            "state": state,
            "session": session,
            "error": ui.error,
            "ui": ui,
        }))?;
    } else if ok {
        app.output.success("Session started.");
        app.renderer().render_session(session.as_ref());
    } else if let ConfirmOutcome::Refused = outcome {
        app.output
            .error(&format!("Launch refused: {}", refusal_reason(&ui)));
    } else {
        let message = ui.error.as_deref().unwrap_or("Launch failed.");
        app.output.error(message);
        app.output.info("Nothing was started. Retry with: preboot launch");
    }

    Ok(if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}
