//! Bootstrap flow behaviour against in-memory ports.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use preboot_cli::application::services::BootstrapFlow;
use preboot_cli::domain::{HostPatch, OpState, PolicyStatus, SessionGuard, SessionMode};
use preboot_common::{ExecutionBackend, TopologyMode, VpnAction};
use serde_json::json;

use crate::mocks::{RecordingShell, StubApi, raw_peer, starved_report};

fn flow(api: StubApi) -> (Arc<StubApi>, BootstrapFlow<StubApi, RecordingShell>, RecordingShell) {
    let api = Arc::new(api);
    let shell = RecordingShell::default();
    let flow = BootstrapFlow::new(
        Arc::clone(&api),
        shell.clone(),
        SessionGuard::new(),
        Some("rt-7".into()),
    );
    (api, flow, shell)
}

fn record_states(flow: &BootstrapFlow<StubApi, RecordingShell>) -> Arc<Mutex<Vec<OpState>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    flow.subscribe(move |op, _| sink.lock().unwrap().push(op));
    seen
}

#[tokio::test]
async fn test_subscribe_delivers_current_state_immediately() {
    let (_, flow, _) = flow(StubApi::new());
    let seen = record_states(&flow);
    assert_eq!(*seen.lock().unwrap(), vec![OpState::Init]);
}

#[tokio::test]
async fn test_unsubscribed_listener_is_not_called() {
    let (_, flow, _) = flow(StubApi::new());
    let seen = Arc::new(Mutex::new(0usize));
    let sink = Arc::clone(&seen);
    let id = flow.subscribe(move |_, _| *sink.lock().unwrap() += 1);
    flow.unsubscribe(id);
    flow.set_mode(TopologyMode::Local);
    assert_eq!(*seen.lock().unwrap(), 1);
}

#[tokio::test]
async fn test_discovery_loads_status_and_trusted_peers() {
    let mut api = StubApi::new();
    api.trusted = vec![raw_peer("a", "10.0.0.2", true, true)];
    let (_, flow, _) = flow(api);
    let seen = record_states(&flow);

    flow.start_discovery().await.unwrap();

    let ctx = flow.context();
    assert_eq!(ctx.engine_status, Some(json!({ "engine": "up" })));
    assert_eq!(ctx.remote.trusted.len(), 1);
    assert_eq!(flow.op_state(), OpState::Idle);
    assert!(seen.lock().unwrap().contains(&OpState::Discovery));
}

#[tokio::test]
async fn test_discovery_failure_still_ends_idle() {
    let mut api = StubApi::new();
    api.fail_status = true;
    let (api, flow, _) = flow(api);

    assert!(flow.start_discovery().await.is_err());
    assert_eq!(flow.op_state(), OpState::Idle);
    assert_eq!(api.count("trusted"), 0);
}

#[tokio::test]
async fn test_trusted_failure_is_absorbed() {
    let mut api = StubApi::new();
    api.fail_trusted = true;
    let (_, flow, _) = flow(api);

    flow.start_discovery().await.unwrap();
    assert!(flow.context().remote.trusted.is_empty());
    assert!(flow.context().engine_status.is_some());
}

#[tokio::test]
async fn test_concurrent_scan_contacts_service_once() {
    let mut api = StubApi::new();
    api.scanned = vec![raw_peer("a", "10.0.0.2", true, true)];
    let (api, flow, _) = flow(api);

    let (first, second) = tokio::join!(flow.scan_network(), flow.scan_network());

    assert_eq!(api.count("scan"), 1);
    assert_eq!(first.len(), 1);
    assert!(second.is_empty());
    let ctx = flow.context();
    assert!(!ctx.remote.scanning);
    assert!(ctx.remote.scan_started_at.is_none());
    assert_eq!(flow.op_state(), OpState::Idle);
}

#[tokio::test]
async fn test_scan_can_run_again_after_completion() {
    let (api, flow, _) = flow(StubApi::new());
    flow.scan_network().await;
    flow.scan_network().await;
    assert_eq!(api.count("scan"), 2);
}

#[tokio::test]
async fn test_scan_failure_yields_empty_and_clears_flags() {
    let mut api = StubApi::new();
    api.fail_scan = true;
    let (_, flow, _) = flow(api);

    assert!(flow.scan_network().await.is_empty());
    assert!(!flow.context().remote.scanning);
    assert_eq!(flow.op_state(), OpState::Idle);
}

#[tokio::test]
async fn test_scans_merge_into_discovered() {
    let mut api = StubApi::new();
    api.scanned = vec![
        raw_peer("a", "10.0.0.2", true, true),
        raw_peer("b", "10.0.0.3", false, false),
    ];
    let (_, flow, _) = flow(api);

    flow.scan_network().await;
    flow.scan_network().await;

    let ids: Vec<String> = flow
        .context()
        .remote
        .discovered
        .into_iter()
        .map(|p| p.id)
        .collect();
    assert_eq!(ids, vec!["a", "b"]);
}

#[tokio::test]
async fn test_set_host_selects_lan_backend() {
    let (_, flow, _) = flow(StubApi::new());
    flow.set_mode(TopologyMode::Remote);
    let peer = preboot_cli::domain::PeerRecord::from_raw(raw_peer("a", "10.0.0.2", true, true));
    flow.set_host(peer);

    let ctx = flow.context();
    assert_eq!(ctx.remote.selected.unwrap().id, "a");
    assert_eq!(ctx.topology.backend, Some(ExecutionBackend::Lan));
}

#[tokio::test]
async fn test_entering_remote_clears_previous_selection() {
    let (_, flow, _) = flow(StubApi::new());
    flow.set_host(preboot_cli::domain::PeerRecord::from_raw(raw_peer(
        "a", "10.0.0.2", true, true,
    )));
    flow.set_mode(TopologyMode::Remote);
    let ctx = flow.context();
    assert!(ctx.remote.selected.is_none());
    assert!(ctx.topology.backend.is_none());
}

#[tokio::test]
async fn test_probe_answer_replaces_every_copy_of_the_peer() {
    let mut api = StubApi::new();
    api.scanned = vec![raw_peer("a", "10.0.0.2", false, false)];
    api.probes
        .insert("10.0.0.2".into(), raw_peer("a", "10.0.0.2", true, true));
    let (_, flow, _) = flow(api);

    flow.scan_network().await;
    let discovered = flow.context().remote.discovered[0].clone();
    flow.set_host(discovered);
    let probed = flow.probe_remote_target("10.0.0.2").await.unwrap();

    assert!(probed.unwrap().is_ready());
    let ctx = flow.context();
    assert!(ctx.remote.discovered[0].is_ready());
    assert!(ctx.remote.selected.unwrap().is_ready());
}

#[tokio::test]
async fn test_probe_without_resources_clears_stale_readiness() {
    let mut api = StubApi::new();
    api.trusted = vec![raw_peer("a", "10.0.0.2", true, true)];
    let mut answer = raw_peer("a", "10.0.0.2", true, true);
    answer.resources = None;
    api.probes.insert("10.0.0.2".into(), answer);
    let (_, flow, _) = flow(api);

    flow.start_discovery().await.unwrap();
    let trusted = flow.context().remote.trusted[0].clone();
    assert!(trusted.is_ready());
    flow.set_host(trusted);
    flow.probe_remote_target("10.0.0.2").await.unwrap();

    let ctx = flow.context();
    assert_eq!(ctx.remote.trusted[0].resources, None);
    assert!(!ctx.remote.selected.unwrap().is_ready());
}

#[tokio::test]
async fn test_probe_unknown_target_is_none() {
    let (_, flow, _) = flow(StubApi::new());
    assert!(flow.probe_remote_target("10.9.9.9").await.unwrap().is_none());
}

#[tokio::test]
async fn test_update_host_is_last_write_wins() {
    let mut api = StubApi::new();
    api.scanned = vec![raw_peer("a", "10.0.0.2", true, true)];
    let (_, flow, _) = flow(api);
    flow.scan_network().await;

    flow.update_host("a", &HostPatch::unreachable());
    flow.update_host(
        "a",
        &HostPatch {
            online: Some(true),
            ..HostPatch::default()
        },
    );

    let peer = flow.context().remote.discovered[0].clone();
    assert_eq!(peer.online, Some(true));
    assert_eq!(peer.resources.unwrap().available, Some(false));
}

#[tokio::test]
async fn test_verify_stores_profile_and_verdict() {
    let (_, flow, _) = flow(StubApi::new());
    let verdict = flow.fetch_system_verify().await.unwrap();

    assert_eq!(verdict.status, PolicyStatus::Approved);
    let ctx = flow.context();
    assert!(ctx.system.verified);
    assert_eq!(ctx.system.supported, Some(true));
    assert!(ctx.local.profile.is_some());
    assert_eq!(flow.op_state(), OpState::Idle);
}

#[tokio::test]
async fn test_verify_blocked_machine_is_unsupported() {
    let mut api = StubApi::new();
    api.report = starved_report();
    let (_, flow, _) = flow(api);

    let verdict = flow.fetch_system_verify().await.unwrap();
    assert!(verdict.is_blocked());
    assert_eq!(flow.context().system.supported, Some(false));
}

#[tokio::test]
async fn test_vpn_response_is_merged() {
    let mut api = StubApi::new();
    api.vpn_reply = json!({ "connected": true, "peer": "gw-1" })
        .as_object()
        .unwrap()
        .clone();
    let (api, flow, _) = flow(api);

    let vpn = flow.vpn_action(VpnAction::Connect).await.unwrap();
    assert!(vpn.connected);
    assert!(!vpn.required);
    assert_eq!(vpn.extra.get("peer"), Some(&json!("gw-1")));
    assert_eq!(api.count("vpn:connect"), 1);
}

#[tokio::test]
async fn test_launch_without_mode_is_a_no_op() {
    let (api, flow, _) = flow(StubApi::new());
    assert_eq!(flow.launch().await, OpState::Init);
    assert_eq!(api.count("decide"), 0);
    assert!(!flow.session().is_active());
}

#[tokio::test]
async fn test_local_launch_starts_local_session() {
    let (api, flow, shell) = flow(StubApi::new());
    flow.set_mode(TopologyMode::Local);
    flow.fetch_system_verify().await.unwrap();

    assert_eq!(flow.launch().await, OpState::Ready);
    flow.settle_background(Duration::from_secs(1)).await;

    let session = flow.session().get().unwrap();
    assert_eq!(session.mode, SessionMode::Local);
    assert_eq!(session.session_id.as_deref(), Some("sess-1"));
    assert_eq!(session.runtime_id.as_deref(), Some("rt-7"));
    assert_eq!(shell.entered(), vec![session]);
    assert_eq!(api.count("commit"), 1);
    assert!(api.decided()[0].host.is_none());
}

#[tokio::test]
async fn test_decide_rejection_ends_in_error_without_session() {
    let api = StubApi::new();
    api.reject_decide(Some(503));
    let (api, flow, shell) = flow(api);
    flow.set_mode(TopologyMode::Local);

    assert_eq!(flow.launch().await, OpState::Error);
    assert!(!flow.session().is_active());
    assert!(shell.entered().is_empty());
    assert_eq!(api.count("commit"), 0);
    let error = flow.context().last_error.unwrap();
    assert!(error.contains("503"), "got: {error}");
}

#[tokio::test]
async fn test_launch_retry_after_error_clears_last_error() {
    let api = StubApi::new();
    api.reject_decide(Some(500));
    let (api, flow, _) = flow(api);
    flow.set_mode(TopologyMode::Local);
    assert_eq!(flow.launch().await, OpState::Error);
    assert!(flow.context().last_error.is_some());

    api.reject_decide(None);
    assert_eq!(flow.launch().await, OpState::Ready);
    assert!(flow.context().last_error.is_none());
    assert_eq!(api.count("decide"), 2);
}

#[tokio::test]
async fn test_missing_session_info_still_launches() {
    let mut api = StubApi::new();
    api.fail_session_info = true;
    let (_, flow, _) = flow(api);
    flow.set_mode(TopologyMode::Local);

    assert_eq!(flow.launch().await, OpState::Ready);
    assert!(flow.session().get().unwrap().session_id.is_none());
}

#[tokio::test]
async fn test_commit_failure_does_not_affect_launch() {
    let mut api = StubApi::new();
    api.fail_commit = true;
    let (api, flow, _) = flow(api);
    flow.set_mode(TopologyMode::Local);

    assert_eq!(flow.launch().await, OpState::Ready);
    flow.settle_background(Duration::from_secs(1)).await;
    assert_eq!(api.count("commit"), 1);
    assert!(flow.session().is_active());
}

#[tokio::test]
async fn test_hung_commit_does_not_block_launch_or_exit() {
    let mut api = StubApi::new();
    api.hang_commit = true;
    let (api, flow, shell) = flow(api);
    flow.set_mode(TopologyMode::Local);

    let op = tokio::time::timeout(Duration::from_secs(2), flow.launch())
        .await
        .expect("launch waited on commit");
    assert_eq!(op, OpState::Ready);
    assert_eq!(shell.entered().len(), 1);

    tokio::time::timeout(
        Duration::from_secs(2),
        flow.settle_background(Duration::from_millis(50)),
    )
    .await
    .expect("settle outlived its grace period");
    assert_eq!(api.count("commit"), 1);
    assert!(flow.session().is_active());
}

#[tokio::test]
async fn test_main_view_failure_rolls_back_session() {
    let api = Arc::new(StubApi::new());
    let flow = BootstrapFlow::new(
        Arc::clone(&api),
        RecordingShell::failing(),
        SessionGuard::new(),
        None,
    );
    flow.set_mode(TopologyMode::Local);

    assert_eq!(flow.launch().await, OpState::Error);
    assert!(!flow.session().is_active());
}

#[tokio::test]
async fn test_launch_with_active_session_fails() {
    let api = Arc::new(StubApi::new());
    let guard = SessionGuard::new();
    guard.start(SessionMode::Local, None, None).unwrap();
    let flow = BootstrapFlow::new(Arc::clone(&api), RecordingShell::default(), guard, None);
    flow.set_mode(TopologyMode::Local);

    assert_eq!(flow.launch().await, OpState::Error);
    assert!(flow.context().last_error.unwrap().contains("already active"));
}
