//! Application service: the bootstrap flow.
//!
//! `BootstrapFlow` owns the only authoritative orchestration state and
//! performs every exchange with the preboot service. Listeners receive
//! `(OpState, &PrebootContext)` once on subscribe and after every change.
//!
//! State lives behind a `std::sync::Mutex` that is never held across an
//! `.await`; listeners run after the lock is released, so they may call back
//! into the flow.

use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use preboot_common::{ExecutionBackend, TopologyMode, VpnAction};

use crate::application::ports::{AppShell, PrebootApi};
use crate::domain::context::VpnState;
use crate::domain::{
    CapabilitySnapshot, HostPatch, LaunchRequest, OpState, PeerRecord, PolicyVerdict,
    PrebootContext, ResourcesPatch, Session, SessionGuard, SessionMode, evaluate_local_policy,
    merge_hosts,
};

/// Callback invoked with every state change.
pub type FlowListener = Arc<dyn Fn(OpState, &PrebootContext) + Send + Sync>;

/// Handle returned by [`BootstrapFlow::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

struct FlowState {
    op: OpState,
    ctx: PrebootContext,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Runs its closure when dropped, including on early return via `?`.
struct OnExit<F: FnMut()>(F);

impl<F: FnMut()> Drop for OnExit<F> {
    fn drop(&mut self) {
        (self.0)();
    }
}

/// Spawn a call whose result nobody waits for. Failures are only logged.
///
/// Returns `None` when there is no runtime to spawn on.
pub fn spawn_best_effort<F>(label: &'static str, call: F) -> Option<JoinHandle<()>>
where
    F: Future<Output = Result<()>> + Send + 'static,
{
    let Ok(runtime) = tokio::runtime::Handle::try_current() else {
        warn!(call = label, "no async runtime, best-effort call dropped");
        return None;
    };
    Some(runtime.spawn(async move {
        match call.await {
            Ok(()) => debug!(call = label, "best-effort call completed"),
            Err(e) => warn!(call = label, error = %e, "best-effort call failed"),
        }
    }))
}

pub struct BootstrapFlow<A, S> {
    api: Arc<A>,
    shell: S,
    session: SessionGuard,
    runtime_id: Option<String>,
    state: Mutex<FlowState>,
    listeners: Mutex<Vec<(ListenerId, FlowListener)>>,
    next_listener: AtomicU64,
    scan_in_flight: AtomicBool,
    background: Mutex<Vec<JoinHandle<()>>>,
}

impl<A: PrebootApi, S: AppShell> BootstrapFlow<A, S> {
    pub fn new(api: Arc<A>, shell: S, session: SessionGuard, runtime_id: Option<String>) -> Self {
        Self {
            api,
            shell,
            session,
            runtime_id,
            state: Mutex::new(FlowState {
                op: OpState::Init,
                ctx: PrebootContext::default(),
            }),
            listeners: Mutex::new(Vec::new()),
            next_listener: AtomicU64::new(0),
            scan_in_flight: AtomicBool::new(false),
            background: Mutex::new(Vec::new()),
        }
    }

    // ── Subscription ─────────────────────────────────────────────────────────

    /// Register a listener. It is called immediately with the current state.
    pub fn subscribe(
        &self,
        listener: impl Fn(OpState, &PrebootContext) + Send + Sync + 'static,
    ) -> ListenerId {
        let id = ListenerId(self.next_listener.fetch_add(1, Ordering::Relaxed));
        let listener: FlowListener = Arc::new(listener);
        lock(&self.listeners).push((id, Arc::clone(&listener)));
        let (op, ctx) = self.snapshot();
        listener(op, &ctx);
        id
    }

    pub fn unsubscribe(&self, id: ListenerId) {
        lock(&self.listeners).retain(|(registered, _)| *registered != id);
    }

    fn emit(&self) {
        let (op, ctx) = self.snapshot();
        let listeners: Vec<FlowListener> = lock(&self.listeners)
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();
        for listener in listeners {
            listener(op, &ctx);
        }
    }

    // ── Accessors ────────────────────────────────────────────────────────────

    fn snapshot(&self) -> (OpState, PrebootContext) {
        let state = lock(&self.state);
        (state.op, state.ctx.clone())
    }

    #[must_use]
    pub fn context(&self) -> PrebootContext {
        lock(&self.state).ctx.clone()
    }

    #[must_use]
    pub fn op_state(&self) -> OpState {
        lock(&self.state).op
    }

    #[must_use]
    pub fn session(&self) -> &SessionGuard {
        &self.session
    }

    // ── Mutation helpers ─────────────────────────────────────────────────────

    fn update<R>(&self, mutate: impl FnOnce(&mut PrebootContext) -> R) -> R {
        let out = mutate(&mut lock(&self.state).ctx);
        self.emit();
        out
    }

    fn update_with_op(&self, op: OpState, mutate: impl FnOnce(&mut PrebootContext)) {
        {
            let mut state = lock(&self.state);
            mutate(&mut state.ctx);
            state.op = op;
        }
        self.emit();
    }

    fn set_op_state(&self, next: OpState) {
        {
            let mut state = lock(&self.state);
            if state.op == next {
                return;
            }
            debug!(from = %state.op, to = %next, "op state");
            state.op = next;
        }
        self.emit();
    }

    // ── Operations ───────────────────────────────────────────────────────────

    pub fn set_mode(&self, mode: TopologyMode) {
        self.update(|ctx| ctx.select_mode(mode));
    }

    /// Fetch the engine status and, best-effort, the trusted peers.
    ///
    /// # Errors
    ///
    /// Returns an error if the status exchange fails. The flow still ends
    /// in `IDLE`.
    pub async fn start_discovery(&self) -> Result<()> {
        self.set_op_state(OpState::Discovery);
        let _idle = OnExit(|| self.set_op_state(OpState::Idle));

        let status = self
            .api
            .engine_status()
            .await
            .context("fetching engine status")?;
        self.update(|ctx| ctx.engine_status = Some(status));

        match self.api.trusted_hosts().await {
            Ok(raw) => {
                let trusted: Vec<PeerRecord> = raw.into_iter().map(PeerRecord::from_raw).collect();
                debug!(count = trusted.len(), "trusted peers loaded");
                self.update(|ctx| ctx.remote.trusted = trusted);
            }
            Err(e) => debug!(error = %e, "trusted peers unavailable"),
        }
        Ok(())
    }

    /// Scan the LAN and merge the result into the discovered set.
    ///
    /// Only one scan runs at a time; a request while one is in flight returns
    /// an empty list without contacting the service. Failures are logged and
    /// also yield an empty list.
    pub async fn scan_network(&self) -> Vec<PeerRecord> {
        if self.scan_in_flight.swap(true, Ordering::AcqRel) {
            debug!("scan already in flight, request ignored");
            return Vec::new();
        }
        let _finish = OnExit(|| {
            self.update_with_op(OpState::Idle, |ctx| {
                ctx.remote.scanning = false;
                ctx.remote.scan_started_at = None;
            });
            self.scan_in_flight.store(false, Ordering::Release);
        });

        self.update_with_op(OpState::ScanningLan, |ctx| {
            ctx.remote.scanning = true;
            ctx.remote.scan_started_at = Some(Utc::now());
        });

        match self.api.scan_network().await {
            Ok(raw) => {
                let found: Vec<PeerRecord> = raw.into_iter().map(PeerRecord::from_raw).collect();
                info!(count = found.len(), "network scan finished");
                let merged = found.clone();
                self.update(|ctx| {
                    ctx.remote.discovered = merge_hosts(&ctx.remote.discovered, &merged);
                });
                found
            }
            Err(e) => {
                error!(error = %e, "network scan failed");
                Vec::new()
            }
        }
    }

    /// Select a peer; the execution topology becomes `lan`.
    pub fn set_host(&self, peer: PeerRecord) {
        self.update(|ctx| {
            ctx.remote.selected = Some(peer);
            ctx.topology.backend = Some(ExecutionBackend::Lan);
        });
    }

    /// Probe one peer and replace every copy of it with the answer.
    ///
    /// # Errors
    ///
    /// Returns an error if the exchange itself fails. An unknown peer is
    /// `Ok(None)`.
    pub async fn probe_remote_target(&self, target: &str) -> Result<Option<PeerRecord>> {
        let Some(raw) = self
            .api
            .probe_host(target)
            .await
            .with_context(|| format!("probing {target}"))?
        else {
            debug!(target, "probe found nothing");
            return Ok(None);
        };
        let peer = PeerRecord::from_raw(raw);
        self.update(|ctx| ctx.remote.refresh_host(&peer));
        Ok(Some(peer))
    }

    /// Patch a peer by identity in the trusted, discovered and selected sets.
    pub fn update_host(&self, id: &str, patch: &HostPatch) {
        self.update(|ctx| ctx.remote.patch_host(id, patch));
    }

    /// Verify this machine and evaluate the local policy.
    ///
    /// # Errors
    ///
    /// Returns an error if the verify exchange fails. The flow still ends
    /// in `IDLE`.
    pub async fn fetch_system_verify(&self) -> Result<PolicyVerdict> {
        self.set_op_state(OpState::VerifyingLocal);
        let _idle = OnExit(|| self.set_op_state(OpState::Idle));

        let report = self
            .api
            .system_verify()
            .await
            .context("verifying local system")?;
        let profile = CapabilitySnapshot::from_report(&report);
        let verdict = evaluate_local_policy(&profile);
        info!(status = verdict.status.as_str(), "local system verified");

        let stored = verdict.clone();
        self.update(move |ctx| {
            ctx.local.profile = Some(profile);
            ctx.system.verified = true;
            ctx.system.supported = Some(!stored.is_blocked());
            ctx.system.report = Some(report);
            ctx.system.verdict = Some(stored);
        });
        Ok(verdict)
    }

    pub fn set_execution_backend(&self, backend: ExecutionBackend) {
        self.update(|ctx| ctx.topology.backend = Some(backend));
    }

    pub fn set_resources(&self, patch: ResourcesPatch) {
        self.update(|ctx| ctx.resources.merge(patch));
    }

    /// Run a VPN action and merge the response into the VPN state.
    ///
    /// # Errors
    ///
    /// Returns an error if the exchange fails.
    pub async fn vpn_action(&self, action: VpnAction) -> Result<VpnState> {
        let response = self
            .api
            .vpn(action)
            .await
            .with_context(|| format!("vpn {action}"))?;
        Ok(self.update(|ctx| {
            ctx.remote.vpn.merge(response);
            ctx.remote.vpn.clone()
        }))
    }

    /// Launch the session.
    ///
    /// No-op without a mode. Otherwise ends in `READY` with an active
    /// session, or in `ERROR` with none started by this call. Never returns
    /// an error: failures are recorded in the context.
    pub async fn launch(&self) -> OpState {
        let Some(request) = self.context().launch_request() else {
            debug!("launch requested without a mode, ignoring");
            return self.op_state();
        };

        self.update_with_op(OpState::Applying, |ctx| ctx.last_error = None);
        match self.run_launch(request).await {
            Ok(session) => {
                info!(mode = %session.mode, session_id = ?session.session_id, "session started");
                OpState::Ready
            }
            Err(e) => {
                error!(error = %format!("{e:#}"), "launch failed");
                let message = e.to_string();
                self.update_with_op(OpState::Error, |ctx| ctx.last_error = Some(message));
                OpState::Error
            }
        }
    }

    async fn run_launch(&self, request: LaunchRequest) -> Result<Session> {
        let session_id = match self.api.session_info().await {
            Ok(info) => info.session_id,
            Err(e) => {
                debug!(error = %e, "session info unavailable");
                None
            }
        };

        self.api.decide(&request).await?;

        let api = Arc::clone(&self.api);
        let body = request.clone();
        if let Some(handle) = spawn_best_effort("commit", async move { api.commit(&body).await }) {
            lock(&self.background).push(handle);
        }

        let mode = match request.mode {
            TopologyMode::Remote => SessionMode::Remote,
            TopologyMode::Local | TopologyMode::Cloud => SessionMode::Local,
        };
        let session = self.session.start(mode, session_id, self.runtime_id.clone())?;
        self.set_op_state(OpState::Ready);

        if let Err(e) = self.shell.enter_main_view(&session).await {
            self.session.stop();
            return Err(e.context("entering main view"));
        }
        Ok(session)
    }

    /// Give detached best-effort calls up to `grace` to finish. Used before
    /// process exit; the flow itself never waits on them.
    pub async fn settle_background(&self, grace: Duration) {
        let handles: Vec<JoinHandle<()>> = lock(&self.background).drain(..).collect();
        if handles.is_empty() {
            return;
        }
        let deadline = tokio::time::Instant::now() + grace;
        for handle in handles {
            if tokio::time::timeout_at(deadline, handle).await.is_err() {
                debug!("best-effort call still pending at exit");
            }
        }
    }
}
