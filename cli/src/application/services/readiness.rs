//! Application service: readiness polling.

use std::future::Future;
use std::time::Duration;

use tracing::debug;

use crate::application::ports::{PrebootApi, ProgressReporter};

/// How many times to check and how long to wait between checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub attempts: u32,
    pub interval: Duration,
}

impl PollPolicy {
    #[must_use]
    pub fn new(attempts: u32, interval_ms: u64) -> Self {
        Self {
            attempts,
            interval: Duration::from_millis(interval_ms),
        }
    }
}

/// Call `check` until it returns `true` or attempts run out.
///
/// Returns the 1-based attempt that succeeded, or `None`.
pub async fn poll_until<F, Fut>(policy: PollPolicy, mut check: F) -> Option<u32>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = bool>,
{
    for attempt in 1..=policy.attempts {
        if check(attempt).await {
            return Some(attempt);
        }
        if attempt < policy.attempts {
            tokio::time::sleep(policy.interval).await;
        }
    }
    None
}

/// Wait until the preboot service answers its status endpoint.
///
/// Returns the attempt that succeeded, or `None` when the service never
/// answered.
pub async fn wait_until_ready(
    api: &impl PrebootApi,
    policy: PollPolicy,
    reporter: &impl ProgressReporter,
) -> Option<u32> {
    reporter.step("waiting for preboot service...");
    let ready = poll_until(policy, |attempt| async move {
        match api.engine_status().await {
            Ok(_) => true,
            Err(e) => {
                debug!(attempt, error = %e, "preboot service not ready");
                false
            }
        }
    })
    .await;
    match ready {
        Some(attempt) => reporter.success(&format!("preboot service ready (attempt {attempt})")),
        None => reporter.warn(&format!(
            "preboot service did not answer after {} attempts",
            policy.attempts
        )),
    }
    ready
}
