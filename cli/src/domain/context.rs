//! Orchestration state owned by the bootstrap flow.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

use preboot_common::{ExecutionBackend, RawCapabilityReport, TopologyMode};

use crate::domain::capability::CapabilitySnapshot;
use crate::domain::host::{HostPatch, PeerRecord};
use crate::domain::policy::PolicyVerdict;

/// Default VRAM budget requested for the language model.
pub const DEFAULT_LLM_VRAM_GB: f64 = 6.0;

/// Phase of the bootstrap flow.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OpState {
    Init,
    Discovery,
    Idle,
    ScanningLan,
    VerifyingLocal,
    Applying,
    Ready,
    Error,
}

impl OpState {
    /// Phases during which an exchange is in flight.
    #[must_use]
    pub fn is_busy(self) -> bool {
        matches!(
            self,
            Self::Discovery | Self::ScanningLan | Self::VerifyingLocal | Self::Applying
        )
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Init => "INIT",
            Self::Discovery => "DISCOVERY",
            Self::Idle => "IDLE",
            Self::ScanningLan => "SCANNING_LAN",
            Self::VerifyingLocal => "VERIFYING_LOCAL",
            Self::Applying => "APPLYING",
            Self::Ready => "READY",
            Self::Error => "ERROR",
        }
    }
}

impl fmt::Display for OpState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct Topology {
    pub backend: Option<ExecutionBackend>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct LlmResources {
    pub vram_gb: f64,
}

impl Default for LlmResources {
    fn default() -> Self {
        Self {
            vram_gb: DEFAULT_LLM_VRAM_GB,
        }
    }
}

/// Resources requested for the session.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct Resources {
    pub llm: LlmResources,
    /// Backend-specific settings, passed through untouched.
    pub backend: Option<Value>,
}

/// Partial update merged over [`Resources`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourcesPatch {
    pub llm: Option<LlmResources>,
    pub backend: Option<Value>,
}

impl Resources {
    pub fn merge(&mut self, patch: ResourcesPatch) {
        if let Some(llm) = patch.llm {
            self.llm = llm;
        }
        if let Some(backend) = patch.backend {
            self.backend = Some(backend);
        }
    }
}

/// VPN tunnel state as last reported by the service.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct VpnState {
    pub required: bool,
    pub connected: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl VpnState {
    /// Merge a response field-wise. Non-boolean `connected`/`required`
    /// values are kept verbatim in `extra`.
    pub fn merge(&mut self, response: Map<String, Value>) {
        for (key, value) in response {
            match (key.as_str(), &value) {
                ("connected", Value::Bool(flag)) => self.connected = *flag,
                ("required", Value::Bool(flag)) => self.required = *flag,
                _ => {
                    self.extra.insert(key, value);
                }
            }
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct LocalContext {
    pub profile: Option<CapabilitySnapshot>,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct RemoteContext {
    pub trusted: Vec<PeerRecord>,
    pub discovered: Vec<PeerRecord>,
    pub selected: Option<PeerRecord>,
    pub scanning: bool,
    pub scan_started_at: Option<DateTime<Utc>>,
    pub vpn: VpnState,
}

impl RemoteContext {
    /// Patch every copy of a peer: trusted, discovered and the selection.
    pub fn patch_host(&mut self, id: &str, patch: &HostPatch) {
        for peer in self
            .trusted
            .iter_mut()
            .chain(self.discovered.iter_mut())
            .chain(self.selected.iter_mut())
            .filter(|peer| peer.id == id)
        {
            peer.apply(patch);
        }
    }

    /// Replace every copy of a peer with a fresher record of it.
    pub fn refresh_host(&mut self, fresh: &PeerRecord) {
        for peer in self
            .trusted
            .iter_mut()
            .chain(self.discovered.iter_mut())
            .chain(self.selected.iter_mut())
            .filter(|peer| peer.id == fresh.id)
        {
            peer.refresh(fresh);
        }
    }
}

/// Outcome of the last local verification.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct SystemState {
    pub verified: bool,
    pub supported: Option<bool>,
    pub report: Option<RawCapabilityReport>,
    pub verdict: Option<PolicyVerdict>,
}

/// Everything the flow knows. Cloned out as a snapshot for subscribers.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct PrebootContext {
    pub mode: Option<TopologyMode>,
    pub local: LocalContext,
    pub remote: RemoteContext,
    /// Opaque engine status from the last discovery.
    pub engine_status: Option<Value>,
    pub system: SystemState,
    pub topology: Topology,
    pub resources: Resources,
    /// Message of the last failed launch, cleared when a new one starts.
    pub last_error: Option<String>,
}

impl PrebootContext {
    /// Select a mode. Entering `remote` drops any previous host choice and
    /// execution topology.
    pub fn select_mode(&mut self, mode: TopologyMode) {
        self.mode = Some(mode);
        if mode == TopologyMode::Remote {
            self.topology.backend = None;
            self.remote.selected = None;
        }
    }

    /// Body of the decide and commit exchanges. `None` until a mode is chosen.
    #[must_use]
    pub fn launch_request(&self) -> Option<LaunchRequest> {
        let mode = self.mode?;
        Some(LaunchRequest {
            mode,
            topology: self.topology.clone(),
            host: if mode == TopologyMode::Remote {
                self.remote.selected.clone()
            } else {
                None
            },
            resources: self.resources.clone(),
        })
    }
}

/// `{mode, topology, host, resources}` sent to decide and commit.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct LaunchRequest {
    pub mode: TopologyMode,
    pub topology: Topology,
    pub host: Option<PeerRecord>,
    pub resources: Resources,
}
