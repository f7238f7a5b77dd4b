//! Presentation-ready projection of the flow state.
//!
//! [`derive_ui_state`] recomputes everything from scratch on each call; the
//! result is a plain value so callers can suppress duplicates with `==`.

use serde::Serialize;

use preboot_common::TopologyMode;

use crate::domain::context::{OpState, PrebootContext, Resources, Topology, VpnState};
use crate::domain::host::{PeerRecord, apply_status, merge_hosts};
use crate::domain::policy::PolicyStatus;
use crate::domain::summary::{LocalSummary, build_local_summary};

#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DiscoveryStatus {
    #[default]
    Idle,
    Scanning,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct DiscoveryView {
    pub status: DiscoveryStatus,
    pub hosts: Vec<PeerRecord>,
    pub selected_host_id: Option<String>,
}

/// Whether the user may proceed.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct Gates {
    pub can_launch: bool,
    pub can_configure_execution: bool,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct UiState {
    pub mode: Option<TopologyMode>,
    pub local_summary: Option<LocalSummary>,
    pub discovery: DiscoveryView,
    pub selected_host: Option<PeerRecord>,
    pub topology: Topology,
    pub resources: Resources,
    pub vpn: VpnState,
    pub loading: bool,
    pub error: Option<String>,
    pub gates: Gates,
}

/// Gates derived from a UI state (its own `gates` field is ignored).
#[must_use]
pub fn compute_gates(state: &UiState) -> Gates {
    match state.mode {
        Some(TopologyMode::Local) => Gates {
            can_launch: state
                .local_summary
                .as_ref()
                .is_some_and(|s| s.status != PolicyStatus::Blocked),
            can_configure_execution: false,
        },
        Some(TopologyMode::Remote) => {
            let ready = state.selected_host.as_ref().is_some_and(PeerRecord::is_ready);
            Gates {
                can_launch: ready,
                can_configure_execution: ready,
            }
        }
        Some(TopologyMode::Cloud) | None => Gates::default(),
    }
}

#[must_use]
pub fn derive_ui_state(op: OpState, ctx: &PrebootContext) -> UiState {
    let mut state = UiState {
        mode: ctx.mode,
        topology: ctx.topology.clone(),
        resources: ctx.resources.clone(),
        vpn: ctx.remote.vpn.clone(),
        loading: op.is_busy(),
        error: (op == OpState::Error).then(|| {
            ctx.last_error
                .clone()
                .unwrap_or_else(|| "Launch failed.".to_string())
        }),
        ..UiState::default()
    };

    match ctx.mode {
        Some(TopologyMode::Local) => {
            if let (Some(profile), Some(verdict)) = (&ctx.local.profile, &ctx.system.verdict) {
                state.local_summary = Some(build_local_summary(profile, verdict));
            }
        }
        Some(TopologyMode::Remote) => {
            let hosts: Vec<PeerRecord> = merge_hosts(&ctx.remote.trusted, &ctx.remote.discovered)
                .iter()
                .map(apply_status)
                .collect();
            let selected_id = ctx.remote.selected.as_ref().map(|p| p.id.clone());
            state.selected_host = selected_id.as_ref().and_then(|id| {
                hosts
                    .iter()
                    .find(|h| &h.id == id)
                    .cloned()
                    .or_else(|| ctx.remote.selected.as_ref().map(apply_status))
            });
            state.discovery = DiscoveryView {
                status: if ctx.remote.scanning {
                    DiscoveryStatus::Scanning
                } else {
                    DiscoveryStatus::Idle
                },
                hosts,
                selected_host_id: selected_id,
            };
        }
        Some(TopologyMode::Cloud) | None => {}
    }

    state.gates = compute_gates(&state);
    state
}
