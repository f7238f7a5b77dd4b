//! Command implementations

pub mod config;
pub mod launch;
pub mod probe;
pub mod scan;
pub mod session;
pub mod status;
pub mod verify;
pub mod version;
pub mod vpn;
pub mod wait;

use std::future::Future;

use anyhow::Result;

use crate::app::AppContext;
use crate::output::progress;

/// Await `work` behind a spinner when the terminal wants one.
pub(crate) async fn with_spinner<T>(
    app: &AppContext,
    message: &str,
    done: &str,
    work: impl Future<Output = Result<T>>,
) -> Result<T> {
    let pb = progress::maybe_spinner(&app.output, app.is_json(), message);
    let result = work.await;
    if let Some(pb) = pb {
        match &result {
            Ok(_) => progress::finish_ok(&pb, done),
            Err(_) => progress::finish_error(&pb, message),
        }
    }
    result
}
