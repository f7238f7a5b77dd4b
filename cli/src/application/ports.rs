//! Port trait definitions for the Application layer.
//!
//! Ports are the interfaces (contracts) that infrastructure must fulfill.
//! This file imports only from `crate::domain` and the shared wire types,
//! never from `crate::infra`, `crate::commands`, or `crate::output`.

use std::future::Future;
use std::path::PathBuf;

use anyhow::Result;
use serde_json::{Map, Value};

use preboot_common::{RawCapabilityReport, RawPeer, SessionInfo, VpnAction};

use crate::domain::{LaunchRequest, PrebootConfig, Session};

// ── Preboot Service Port ──────────────────────────────────────────────────────

/// Exchanges with the preboot HTTP service.
///
/// Futures are `Send` so that fire-and-forget calls can run on a detached
/// task. Implementations may use `async fn`.
pub trait PrebootApi: Send + Sync + 'static {
    /// Opaque engine status. Also serves as the readiness probe.
    fn engine_status(&self) -> impl Future<Output = Result<Value>> + Send;
    /// Peers already paired with this machine.
    fn trusted_hosts(&self) -> impl Future<Output = Result<Vec<RawPeer>>> + Send;
    /// Peers found by a LAN scan.
    fn scan_network(&self) -> impl Future<Output = Result<Vec<RawPeer>>> + Send;
    /// Probe one peer. `Ok(None)` when the service does not know it.
    fn probe_host(&self, target: &str) -> impl Future<Output = Result<Option<RawPeer>>> + Send;
    /// Local capability report.
    fn system_verify(&self) -> impl Future<Output = Result<RawCapabilityReport>> + Send;
    /// VPN action. `status` is a read, the others mutate.
    fn vpn(&self, action: VpnAction) -> impl Future<Output = Result<Map<String, Value>>> + Send;
    /// Session information, if the service has any.
    fn session_info(&self) -> impl Future<Output = Result<SessionInfo>> + Send;
    /// Blocking launch decision. Any error aborts the launch.
    fn decide(&self, request: &LaunchRequest) -> impl Future<Output = Result<()>> + Send;
    /// Commit the launch. Best-effort.
    fn commit(&self, request: &LaunchRequest) -> impl Future<Output = Result<()>> + Send;
}

// ── Application Shell Port ────────────────────────────────────────────────────

/// Hand-off to the main application once a session is running.
pub trait AppShell: Send + Sync {
    fn enter_main_view(&self, session: &Session) -> impl Future<Output = Result<()>> + Send;
}

// ── Progress Reporting Port ───────────────────────────────────────────────────

/// Abstracts progress reporting so services can emit events without
/// depending on the Presentation layer. Sync trait: no async needed.
pub trait ProgressReporter {
    /// Emit an in-progress step message.
    fn step(&self, message: &str);
    /// Emit a success message.
    fn success(&self, message: &str);
    /// Emit a warning message.
    fn warn(&self, message: &str);
}

// ── State and Config Ports ────────────────────────────────────────────────────

/// Abstracts session persistence between CLI invocations.
#[allow(async_fn_in_trait)]
pub trait SessionStore {
    /// Load the persisted session, returning `None` if there is none.
    async fn load_async(&self) -> Result<Option<Session>>;
    /// Persist the given session.
    async fn save_async(&self, session: &Session) -> Result<()>;
    /// Remove the persisted session. Succeeds when there is nothing to remove.
    async fn clear_async(&self) -> Result<()>;
}

/// Abstracts configuration file access.
pub trait ConfigStore {
    /// Load the configuration, falling back to defaults when the file is absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    fn load(&self) -> Result<PrebootConfig>;
    /// Persist the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    fn save(&self, config: &PrebootConfig) -> Result<()>;
    /// Location of the configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined.
    fn path(&self) -> Result<PathBuf>;
}
