//! Shared in-memory port implementations for unit tests.
//!
//! `StubApi` answers from canned data and records every call so tests can
//! assert on which exchanges happened.

#![allow(clippy::expect_used, clippy::unwrap_used, dead_code)]

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::{Result, bail};
use serde_json::{Map, Value, json};

use preboot_cli::application::ports::{AppShell, ConfigStore, PrebootApi, SessionStore};
use preboot_cli::domain::error::FlowError;
use preboot_cli::domain::{LaunchRequest, PrebootConfig, Session};
use preboot_common::{
    PeerResources, RawCapabilityReport, RawCpu, RawGpu, RawMemory, RawPeer, RawPlatform,
    SessionInfo, VpnAction,
};

// ── Canned payloads ───────────────────────────────────────────────────────────

pub fn raw_peer(id: &str, ip: &str, online: bool, available: bool) -> RawPeer {
    RawPeer {
        host_id: Some(id.to_string()),
        hostname: Some(format!("{id}.lan")),
        ip: Some(ip.to_string()),
        online: Some(online),
        resources: Some(PeerResources {
            available: Some(available),
            ram_free_gb: Some(24.0),
            vram_free_gb: Some(10.0),
        }),
        ..RawPeer::default()
    }
}

/// A workstation with a usable GPU.
pub fn gpu_report() -> RawCapabilityReport {
    RawCapabilityReport {
        platform: Some(RawPlatform {
            os: Some("linux".into()),
            arch: Some("x86_64".into()),
        }),
        cpu: Some(RawCpu {
            cores: Some(16.0),
            load_pct: Some(12.0),
        }),
        memory: Some(RawMemory {
            total_gb: Some(32.0),
            free_gb: Some(20.0),
            used_pct: Some(37.5),
        }),
        gpu: Some(RawGpu {
            present: Some(true),
            vram_total_gb: Some(12.0),
            vram_free_gb: Some(10.0),
            load_pct: Some(5.0),
            name: Some("RTX 4070".into()),
        }),
    }
}

/// A machine with too little free RAM.
pub fn starved_report() -> RawCapabilityReport {
    let mut report = gpu_report();
    report.memory = Some(RawMemory {
        total_gb: Some(8.0),
        free_gb: Some(2.0),
        used_pct: Some(75.0),
    });
    report
}

// ── StubApi ───────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct StubApi {
    pub trusted: Vec<RawPeer>,
    pub scanned: Vec<RawPeer>,
    /// Probe answers keyed by target. Unknown targets answer `None`.
    pub probes: HashMap<String, RawPeer>,
    pub report: RawCapabilityReport,
    pub session_id: Option<String>,
    pub vpn_reply: Map<String, Value>,
    pub fail_status: bool,
    pub fail_trusted: bool,
    pub fail_scan: bool,
    pub fail_probe: bool,
    pub fail_session_info: bool,
    pub fail_commit: bool,
    /// Commit never answers.
    pub hang_commit: bool,
    /// Reject the launch decision with this HTTP status. Can be flipped
    /// between launches.
    decide_rejection: Mutex<Option<u16>>,
    calls: Mutex<Vec<String>>,
    decided: Mutex<Vec<LaunchRequest>>,
}

impl StubApi {
    pub fn reject_decide(&self, status: Option<u16>) {
        *self.decide_rejection.lock().unwrap() = status;
    }

    #[must_use]
    pub fn new() -> Self {
        Self {
            report: gpu_report(),
            session_id: Some("sess-1".into()),
            ..Self::default()
        }
    }

    fn record(&self, call: impl Into<String>) {
        self.calls.lock().unwrap().push(call.into());
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, call: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| *c == call).count()
    }

    pub fn decided(&self) -> Vec<LaunchRequest> {
        self.decided.lock().unwrap().clone()
    }
}

impl PrebootApi for StubApi {
    async fn engine_status(&self) -> Result<Value> {
        self.record("status");
        if self.fail_status {
            bail!("connection refused");
        }
        Ok(json!({ "engine": "up" }))
    }

    async fn trusted_hosts(&self) -> Result<Vec<RawPeer>> {
        self.record("trusted");
        if self.fail_trusted {
            bail!("pairing endpoint down");
        }
        Ok(self.trusted.clone())
    }

    async fn scan_network(&self) -> Result<Vec<RawPeer>> {
        self.record("scan");
        // Give a concurrent caller the chance to run while this scan is open.
        tokio::task::yield_now().await;
        if self.fail_scan {
            bail!("scan timed out");
        }
        Ok(self.scanned.clone())
    }

    async fn probe_host(&self, target: &str) -> Result<Option<RawPeer>> {
        self.record(format!("probe:{target}"));
        if self.fail_probe {
            bail!("probe timed out");
        }
        Ok(self.probes.get(target).cloned())
    }

    async fn system_verify(&self) -> Result<RawCapabilityReport> {
        self.record("verify");
        Ok(self.report.clone())
    }

    async fn vpn(&self, action: VpnAction) -> Result<Map<String, Value>> {
        self.record(format!("vpn:{action}"));
        Ok(self.vpn_reply.clone())
    }

    async fn session_info(&self) -> Result<SessionInfo> {
        self.record("session");
        if self.fail_session_info {
            bail!("no session endpoint");
        }
        Ok(SessionInfo {
            session_id: self.session_id.clone(),
            extra: Map::new(),
        })
    }

    async fn decide(&self, request: &LaunchRequest) -> Result<()> {
        self.record("decide");
        self.decided.lock().unwrap().push(request.clone());
        let rejected = *self.decide_rejection.lock().unwrap();
        if let Some(status) = rejected {
            return Err(FlowError::DecideRejected { status }.into());
        }
        Ok(())
    }

    async fn commit(&self, _request: &LaunchRequest) -> Result<()> {
        self.record("commit");
        if self.hang_commit {
            std::future::pending::<()>().await;
        }
        if self.fail_commit {
            bail!("commit endpoint down");
        }
        Ok(())
    }
}

// ── Shell ─────────────────────────────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct RecordingShell {
    pub entered: Arc<Mutex<Vec<Session>>>,
    pub fail: bool,
}

impl RecordingShell {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn entered(&self) -> Vec<Session> {
        self.entered.lock().unwrap().clone()
    }
}

impl AppShell for RecordingShell {
    async fn enter_main_view(&self, session: &Session) -> Result<()> {
        if self.fail {
            bail!("main view unavailable");
        }
        self.entered.lock().unwrap().push(session.clone());
        Ok(())
    }
}

// ── Stores ────────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct MemorySessionStore {
    pub slot: Mutex<Option<Session>>,
}

impl SessionStore for MemorySessionStore {
    async fn load_async(&self) -> Result<Option<Session>> {
        Ok(self.slot.lock().unwrap().clone())
    }

    async fn save_async(&self, session: &Session) -> Result<()> {
        *self.slot.lock().unwrap() = Some(session.clone());
        Ok(())
    }

    async fn clear_async(&self) -> Result<()> {
        *self.slot.lock().unwrap() = None;
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryConfigStore {
    pub config: Mutex<PrebootConfig>,
    pub saves: Mutex<usize>,
}

impl ConfigStore for MemoryConfigStore {
    fn load(&self) -> Result<PrebootConfig> {
        Ok(self.config.lock().unwrap().clone())
    }

    fn save(&self, config: &PrebootConfig) -> Result<()> {
        *self.config.lock().unwrap() = config.clone();
        *self.saves.lock().unwrap() += 1;
        Ok(())
    }

    fn path(&self) -> Result<PathBuf> {
        Ok(PathBuf::from("/tmp/preboot-test/config.yaml"))
    }
}
