//! UI adapter: change suppression, gates, and end-to-end launches.

#![allow(clippy::unwrap_used)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use preboot_cli::application::services::{BootstrapFlow, ConfirmOutcome, UiAdapter};
use preboot_cli::domain::ui::DiscoveryStatus;
use preboot_cli::domain::{OpState, PolicyStatus, SessionGuard, SessionMode, UiState};
use preboot_common::{ExecutionBackend, PeerStatus, TopologyMode};

use crate::mocks::{RecordingShell, StubApi, raw_peer, starved_report};

type Adapter = UiAdapter<StubApi, RecordingShell>;

fn adapter(api: StubApi) -> (Arc<StubApi>, Adapter) {
    let api = Arc::new(api);
    let flow = Arc::new(BootstrapFlow::new(
        Arc::clone(&api),
        RecordingShell::default(),
        SessionGuard::new(),
        None,
    ));
    (api, UiAdapter::new(flow))
}

fn record(adapter: &Adapter) -> Arc<Mutex<Vec<UiState>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    adapter.subscribe(move |ui| sink.lock().unwrap().push(ui.clone()));
    seen
}

/// Peer `a` at 10.0.0.2: trusted and scanned busy, ready once probed.
fn remote_api() -> StubApi {
    let mut api = StubApi::new();
    api.trusted = vec![raw_peer("a", "10.0.0.2", true, false)];
    api.scanned = vec![
        raw_peer("a", "10.0.0.2", true, false),
        raw_peer("b", "10.0.0.3", false, false),
    ];
    api.probes
        .insert("10.0.0.2".into(), raw_peer("a", "10.0.0.2", true, true));
    api
}

// ── Suppression ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_identical_recomputations_notify_once() {
    let (_, adapter) = adapter(StubApi::new());
    let seen = record(&adapter);

    adapter.select_mode(TopologyMode::Local);
    adapter.select_mode(TopologyMode::Local);
    adapter.flow().update_host("nobody", &preboot_cli::domain::HostPatch::unreachable());

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 2, "initial state plus one mode change");
    assert_eq!(seen[1].mode, Some(TopologyMode::Local));
}

#[tokio::test]
async fn test_unsubscribed_ui_listener_is_silent() {
    let (_, adapter) = adapter(StubApi::new());
    let count = Arc::new(Mutex::new(0usize));
    let sink = Arc::clone(&count);
    let id = adapter.subscribe(move |_| *sink.lock().unwrap() += 1);
    adapter.unsubscribe(id);
    adapter.select_mode(TopologyMode::Remote);
    assert_eq!(*count.lock().unwrap(), 1);
}

#[tokio::test]
async fn test_loading_tracks_busy_phases() {
    let (_, adapter) = adapter(StubApi::new());
    let seen = record(&adapter);

    adapter.flow().start_discovery().await.unwrap();

    let loading: Vec<bool> = seen.lock().unwrap().iter().map(|ui| ui.loading).collect();
    assert_eq!(loading.first(), Some(&false));
    assert!(loading.contains(&true));
    assert_eq!(loading.last(), Some(&false));
}

#[tokio::test]
async fn test_scan_shows_scanning_status_then_idle() {
    let (_, adapter) = adapter(remote_api());
    adapter.select_mode(TopologyMode::Remote);
    let seen = record(&adapter);

    adapter.refresh_scan().await;

    let statuses: Vec<DiscoveryStatus> = seen
        .lock()
        .unwrap()
        .iter()
        .map(|ui| ui.discovery.status)
        .collect();
    assert!(statuses.contains(&DiscoveryStatus::Scanning));
    assert_eq!(statuses.last(), Some(&DiscoveryStatus::Idle));
}

// ── Gates ─────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_gates_closed_without_mode() {
    let (_, adapter) = adapter(StubApi::new());
    let gates = adapter.state().gates;
    assert!(!gates.can_launch);
    assert!(!gates.can_configure_execution);
}

#[tokio::test]
async fn test_local_gates_follow_the_verdict() {
    let (_, adapter) = adapter(StubApi::new());
    adapter.select_mode(TopologyMode::Local);
    assert!(!adapter.state().gates.can_launch, "closed before verification");

    adapter.fetch_system_verify().await.unwrap();
    let ui = adapter.state();
    assert_eq!(ui.local_summary.unwrap().status, PolicyStatus::Approved);
    assert!(ui.gates.can_launch);
    assert!(!ui.gates.can_configure_execution);
}

#[tokio::test]
async fn test_local_gates_closed_when_blocked() {
    let mut api = StubApi::new();
    api.report = starved_report();
    let (_, adapter) = adapter(api);
    adapter.select_mode(TopologyMode::Local);
    adapter.fetch_system_verify().await.unwrap();

    let ui = adapter.state();
    assert_eq!(ui.local_summary.unwrap().status, PolicyStatus::Blocked);
    assert!(!ui.gates.can_launch);
}

#[tokio::test]
async fn test_remote_gates_need_a_ready_selection() {
    let (_, adapter) = adapter(remote_api());
    adapter.flow().start_discovery().await.unwrap();
    adapter.select_mode(TopologyMode::Remote);
    adapter.refresh_scan().await;

    let ui = adapter.state();
    assert_eq!(ui.discovery.hosts.len(), 2);
    assert!(!ui.gates.can_launch, "no selection yet");

    let host = ui.discovery.hosts[0].clone();
    assert_eq!(host.status, Some(PeerStatus::Available));
    adapter.select_host(host).await;

    let ui = adapter.state();
    assert_eq!(ui.discovery.selected_host_id.as_deref(), Some("a"));
    assert!(ui.selected_host.unwrap().is_ready());
    assert!(ui.gates.can_launch);
    assert!(ui.gates.can_configure_execution);
}

#[tokio::test]
async fn test_unanswered_probe_marks_peer_unreachable() {
    let (_, adapter) = adapter(remote_api());
    adapter.select_mode(TopologyMode::Remote);
    adapter.refresh_scan().await;
    let host = adapter.state().discovery.hosts[1].clone();

    adapter.select_host(host).await;

    let ui = adapter.state();
    let selected = ui.selected_host.unwrap();
    assert_eq!(selected.id, "b");
    assert_eq!(selected.online, Some(false));
    assert!(!ui.gates.can_launch);
}

#[tokio::test]
async fn test_failed_probe_marks_peer_unreachable() {
    let mut api = remote_api();
    api.fail_probe = true;
    let (_, adapter) = adapter(api);
    adapter.select_mode(TopologyMode::Remote);
    adapter.refresh_scan().await;
    let host = adapter.state().discovery.hosts[0].clone();

    adapter.select_host(host).await;

    let ui = adapter.state();
    assert!(!ui.selected_host.unwrap().is_ready());
    assert!(!ui.gates.can_configure_execution);
}

#[tokio::test]
async fn test_fresh_peer_without_resources_closes_the_gate() {
    let mut api = StubApi::new();
    api.trusted = vec![raw_peer("a", "10.0.0.2", true, true)];
    let mut fresh = raw_peer("a", "10.0.0.2", true, true);
    fresh.resources = None;
    api.scanned = vec![fresh.clone()];
    api.probes.insert("10.0.0.2".into(), fresh);
    let (_, adapter) = adapter(api);
    adapter.flow().start_discovery().await.unwrap();
    adapter.select_mode(TopologyMode::Remote);
    adapter.refresh_scan().await;

    let host = adapter.state().discovery.hosts[0].clone();
    assert_eq!(host.resources, None);
    adapter.select_host(host).await;

    let ui = adapter.state();
    let selected = ui.selected_host.unwrap();
    assert_eq!(selected.online, Some(true));
    assert_eq!(selected.resources, None);
    assert!(!ui.gates.can_launch);
    assert!(!ui.gates.can_configure_execution);
}

// ── Launch ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_confirm_refused_when_gates_closed() {
    let (api, adapter) = adapter(StubApi::new());
    adapter.select_mode(TopologyMode::Remote);

    assert_eq!(adapter.confirm_preboot().await, ConfirmOutcome::Refused);
    assert_eq!(api.count("decide"), 0);
}

#[tokio::test]
async fn test_end_to_end_remote_launch() {
    let (api, adapter) = adapter(remote_api());
    adapter.flow().start_discovery().await.unwrap();
    adapter.select_mode(TopologyMode::Remote);
    adapter.refresh_scan().await;
    let host = adapter.state().discovery.hosts[0].clone();
    adapter.select_host(host).await;
    adapter.set_execution_backend(ExecutionBackend::Vpn);

    let outcome = adapter.confirm_preboot().await;
    adapter.flow().settle_background(Duration::from_secs(1)).await;

    assert_eq!(outcome, ConfirmOutcome::Finished(OpState::Ready));
    let session = adapter.flow().session().get().unwrap();
    assert_eq!(session.mode, SessionMode::Remote);
    assert!(adapter.flow().session().is_active());

    let request = &api.decided()[0];
    assert_eq!(request.mode, TopologyMode::Remote);
    assert_eq!(request.host.as_ref().unwrap().id, "a");
    assert_eq!(request.topology.backend, Some(ExecutionBackend::Vpn));
    assert_eq!(api.count("commit"), 1);

    let ui = adapter.state();
    assert!(!ui.loading);
    assert!(ui.error.is_none());
}

#[tokio::test]
async fn test_launch_abort_on_decide_failure() {
    let api = StubApi::new();
    api.reject_decide(Some(409));
    let (api, adapter) = adapter(api);
    adapter.select_mode(TopologyMode::Local);
    adapter.fetch_system_verify().await.unwrap();

    let outcome = adapter.confirm_preboot().await;

    assert_eq!(outcome, ConfirmOutcome::Finished(OpState::Error));
    assert!(!adapter.flow().session().is_active());
    assert_eq!(api.count("commit"), 0);
    let ui = adapter.state();
    assert!(!ui.loading);
    assert!(ui.error.unwrap().contains("409"));
    assert!(ui.gates.can_launch, "retry stays possible");
}
