//! Application service: UI derivation adapter.
//!
//! Subscribes to the flow, recomputes a [`UiState`] from scratch on every
//! notification and forwards it only when it differs from the last one
//! delivered. Presentation code reads nothing else.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use anyhow::Result;
use tracing::{trace, warn};

use preboot_common::{ExecutionBackend, TopologyMode, VpnAction};

use crate::application::ports::{AppShell, PrebootApi};
use crate::application::services::bootstrap_flow::{BootstrapFlow, ListenerId};
use crate::domain::context::VpnState;
use crate::domain::{
    Gates, HostPatch, OpState, PeerRecord, PolicyVerdict, PrebootContext, ResourcesPatch, UiState,
    derive_ui_state,
};

pub type UiListener = Arc<dyn Fn(&UiState) + Send + Sync>;

/// Handle returned by [`UiAdapter::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UiListenerId(u64);

/// Outcome of [`UiAdapter::confirm_preboot`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmOutcome {
    /// Gates were closed; nothing happened.
    Refused,
    /// The flow ended in the given state.
    Finished(OpState),
}

#[derive(Debug, Clone, PartialEq)]
struct LogDigest {
    mode: Option<TopologyMode>,
    hosts: usize,
    gates: Gates,
}

#[derive(Default)]
struct Projection {
    last: Option<UiState>,
    digest: Option<LogDigest>,
    listeners: Vec<(UiListenerId, UiListener)>,
}

fn lock(projection: &Mutex<Projection>) -> MutexGuard<'_, Projection> {
    projection.lock().unwrap_or_else(PoisonError::into_inner)
}

fn recompute(projection: &Mutex<Projection>, op: OpState, ctx: &PrebootContext) {
    let next = derive_ui_state(op, ctx);
    let listeners: Vec<UiListener> = {
        let mut p = lock(projection);
        if p.last.as_ref() == Some(&next) {
            return;
        }
        let digest = LogDigest {
            mode: next.mode,
            hosts: next.discovery.hosts.len(),
            gates: next.gates,
        };
        if p.digest.as_ref() != Some(&digest) {
            trace!(
                mode = ?digest.mode,
                hosts = digest.hosts,
                can_launch = digest.gates.can_launch,
                can_configure_execution = digest.gates.can_configure_execution,
                "ui state"
            );
            p.digest = Some(digest);
        }
        p.last = Some(next.clone());
        p.listeners.iter().map(|(_, l)| Arc::clone(l)).collect()
    };
    for listener in listeners {
        listener(&next);
    }
}

pub struct UiAdapter<A: PrebootApi, S: AppShell> {
    flow: Arc<BootstrapFlow<A, S>>,
    projection: Arc<Mutex<Projection>>,
    flow_listener: ListenerId,
    next_listener: AtomicU64,
}

impl<A: PrebootApi, S: AppShell> UiAdapter<A, S> {
    pub fn new(flow: Arc<BootstrapFlow<A, S>>) -> Self {
        let projection = Arc::new(Mutex::new(Projection::default()));
        let sink = Arc::clone(&projection);
        let flow_listener = flow.subscribe(move |op, ctx| recompute(&sink, op, ctx));
        Self {
            flow,
            projection,
            flow_listener,
            next_listener: AtomicU64::new(0),
        }
    }

    #[must_use]
    pub fn flow(&self) -> &Arc<BootstrapFlow<A, S>> {
        &self.flow
    }

    /// Current UI state.
    #[must_use]
    pub fn state(&self) -> UiState {
        lock(&self.projection).last.clone().unwrap_or_default()
    }

    /// Register a listener. It is called immediately with the current state.
    pub fn subscribe(&self, listener: impl Fn(&UiState) + Send + Sync + 'static) -> UiListenerId {
        let id = UiListenerId(self.next_listener.fetch_add(1, Ordering::Relaxed));
        let listener: UiListener = Arc::new(listener);
        lock(&self.projection)
            .listeners
            .push((id, Arc::clone(&listener)));
        listener(&self.state());
        id
    }

    pub fn unsubscribe(&self, id: UiListenerId) {
        lock(&self.projection)
            .listeners
            .retain(|(registered, _)| *registered != id);
    }

    // ── Intents ──────────────────────────────────────────────────────────────

    pub fn select_mode(&self, mode: TopologyMode) {
        self.flow.set_mode(mode);
    }

    pub async fn refresh_scan(&self) -> Vec<PeerRecord> {
        self.flow.scan_network().await
    }

    /// Select a peer and probe it. A peer that does not answer is marked
    /// offline with no available resources.
    pub async fn select_host(&self, peer: PeerRecord) {
        let id = peer.id.clone();
        let target = peer.probe_target().to_string();
        self.flow.set_host(peer);
        match self.flow.probe_remote_target(&target).await {
            Ok(Some(_)) => {}
            Ok(None) => self.flow.update_host(&id, &HostPatch::unreachable()),
            Err(e) => {
                warn!(peer = %id, error = %e, "probe failed");
                self.flow.update_host(&id, &HostPatch::unreachable());
            }
        }
    }

    pub fn set_execution_backend(&self, backend: ExecutionBackend) {
        self.flow.set_execution_backend(backend);
    }

    pub fn set_resources(&self, patch: ResourcesPatch) {
        self.flow.set_resources(patch);
    }

    /// # Errors
    ///
    /// Returns an error if the verify exchange fails.
    pub async fn fetch_system_verify(&self) -> Result<PolicyVerdict> {
        self.flow.fetch_system_verify().await
    }

    /// # Errors
    ///
    /// Returns an error if the VPN exchange fails.
    pub async fn vpn_action(&self, action: VpnAction) -> Result<VpnState> {
        self.flow.vpn_action(action).await
    }

    /// Launch if the gates allow it.
    pub async fn confirm_preboot(&self) -> ConfirmOutcome {
        if !self.state().gates.can_launch {
            warn!("launch blocked by gates");
            return ConfirmOutcome::Refused;
        }
        ConfirmOutcome::Finished(self.flow.launch().await)
    }
}

impl<A: PrebootApi, S: AppShell> Drop for UiAdapter<A, S> {
    fn drop(&mut self) {
        self.flow.unsubscribe(self.flow_listener);
    }
}
