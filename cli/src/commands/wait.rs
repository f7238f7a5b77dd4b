//! `preboot wait`: poll the preboot service until it answers.

use anyhow::Result;
use clap::Args;
use std::process::ExitCode;

use crate::app::AppContext;
use crate::application::services::readiness::{PollPolicy, wait_until_ready};
use crate::output::json;
use crate::output::reporter::SilentReporter;

#[derive(Args)]
pub struct WaitArgs {
    /// Number of status checks (default: ready.attempts)
    #[arg(long)]
    pub attempts: Option<u32>,

    /// Delay between checks in milliseconds (default: ready.interval_ms)
    #[arg(long)]
    pub interval_ms: Option<u64>,
}

/// Run `preboot wait`. Exits non-zero when the service never answered.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub async fn run(app: &AppContext, args: &WaitArgs) -> Result<ExitCode> {
    let policy = PollPolicy::new(
        args.attempts.unwrap_or(app.config.ready.attempts),
        args.interval_ms.unwrap_or(app.config.ready.interval_ms),
    );

    let ready = if app.is_json() {
        let ready = wait_until_ready(app.api.as_ref(), policy, &SilentReporter).await;
        json::print(&serde_json::json!({
            "ready": ready.is_some(),
            "attempt": ready,
            "attempts": policy.attempts,
        }))?;
        ready
    } else {
        wait_until_ready(app.api.as_ref(), policy, &app.terminal_reporter()).await
    };

    Ok(if ready.is_some() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
