//! `preboot vpn`: VPN tunnel actions.

use anyhow::Result;
use clap::Args;
use std::process::ExitCode;

use preboot_common::VpnAction;

use crate::app::AppContext;
use crate::commands::with_spinner;
use crate::output::json;

#[derive(Args)]
pub struct VpnArgs {
    /// Action to run
    #[arg(value_enum)]
    pub action: VpnAction,
}

/// Run `preboot vpn`.
///
/// # Errors
///
/// Returns an error if the VPN exchange fails.
pub async fn run(app: &AppContext, args: &VpnArgs) -> Result<ExitCode> {
    let (_flow, adapter) = app.engine();
    let action = args.action;
    let state = with_spinner(
        app,
        &format!("vpn {action}..."),
        &format!("vpn {action} done"),
        adapter.vpn_action(action),
    )
    .await?;

    if app.is_json() {
        json::print(&state)?;
    } else {
        app.renderer().render_vpn(&state);
    }
    Ok(ExitCode::SUCCESS)
}
