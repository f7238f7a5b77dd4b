//! HTTP routes of the stub service.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{Value, json};

use preboot_common::{VpnAction, endpoints};

use crate::fixture::Fixture;

/// Shared handler state.
pub struct StubState {
    fixture: Fixture,
    scan_delay: Duration,
    refuse_decide: bool,
    vpn_connected: AtomicBool,
    decisions: AtomicU64,
}

impl StubState {
    #[must_use]
    pub fn new(fixture: Fixture, scan_delay: Duration, refuse_decide: bool) -> Self {
        let connected = fixture
            .vpn
            .get("connected")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        Self {
            fixture,
            scan_delay,
            refuse_decide,
            vpn_connected: AtomicBool::new(connected),
            decisions: AtomicU64::new(0),
        }
    }

    /// Number of accepted launch decisions.
    #[must_use]
    pub fn decisions(&self) -> u64 {
        self.decisions.load(Ordering::Relaxed)
    }

    fn vpn_body(&self) -> Value {
        let mut body = match &self.fixture.vpn {
            Value::Object(map) => map.clone(),
            _ => serde_json::Map::new(),
        };
        body.insert(
            "connected".to_string(),
            Value::Bool(self.vpn_connected.load(Ordering::Relaxed)),
        );
        Value::Object(body)
    }
}

/// Build the router over `state`.
pub fn router(state: Arc<StubState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route(endpoints::STATUS, get(status))
        .route(endpoints::PAIRING_ONLINE, get(trusted))
        .route(endpoints::NETWORK_SCAN, get(scan))
        .route(endpoints::HOST_PROBE, get(probe))
        .route(endpoints::SYSTEM_VERIFY, get(verify))
        .route(endpoints::SESSION, get(session))
        .route(endpoints::DECIDE, post(decide))
        .route(endpoints::COMMIT, post(commit))
        .route(&endpoints::vpn(VpnAction::Status), get(vpn_status))
        .route(&endpoints::vpn(VpnAction::Connect), post(vpn_connect))
        .route(&endpoints::vpn(VpnAction::Disconnect), post(vpn_disconnect))
        .with_state(state)
}

async fn health() -> StatusCode {
    StatusCode::OK
}

async fn status(State(state): State<Arc<StubState>>) -> Json<Value> {
    Json(state.fixture.status.clone())
}

async fn trusted(State(state): State<Arc<StubState>>) -> Json<Value> {
    Json(json!({ "hosts": state.fixture.trusted }))
}

async fn scan(State(state): State<Arc<StubState>>) -> Json<Value> {
    if !state.scan_delay.is_zero() {
        tokio::time::sleep(state.scan_delay).await;
    }
    tracing::info!(hosts = state.fixture.scan.len(), "network scan");
    Json(json!({ "hosts": state.fixture.scan }))
}

#[derive(Debug, Deserialize)]
struct ProbeQuery {
    target: Option<String>,
}

async fn probe(State(state): State<Arc<StubState>>, Query(query): Query<ProbeQuery>) -> Response {
    let Some(target) = query.target.filter(|t| !t.is_empty()) else {
        return StatusCode::BAD_REQUEST.into_response();
    };
    match state.fixture.probe(&target) {
        Some(host) => Json(json!({ "host": host })).into_response(),
        None => {
            tracing::debug!(%target, "probe target unknown");
            StatusCode::NOT_FOUND.into_response()
        }
    }
}

async fn verify(State(state): State<Arc<StubState>>) -> Json<Value> {
    Json(state.fixture.verify.clone())
}

async fn session(State(state): State<Arc<StubState>>) -> Json<Value> {
    Json(state.fixture.session.clone())
}

async fn decide(State(state): State<Arc<StubState>>, Json(body): Json<Value>) -> Response {
    if state.refuse_decide {
        tracing::warn!(request = %body, "refusing launch decision");
        return StatusCode::SERVICE_UNAVAILABLE.into_response();
    }
    state.decisions.fetch_add(1, Ordering::Relaxed);
    tracing::info!(request = %body, "launch decision accepted");
    Json(json!({ "accepted": true })).into_response()
}

async fn commit(Json(body): Json<Value>) -> StatusCode {
    tracing::info!(request = %body, "launch decision committed");
    StatusCode::NO_CONTENT
}

async fn vpn_status(State(state): State<Arc<StubState>>) -> Json<Value> {
    Json(state.vpn_body())
}

async fn vpn_connect(State(state): State<Arc<StubState>>) -> Json<Value> {
    state.vpn_connected.store(true, Ordering::Relaxed);
    tracing::info!("vpn connected");
    Json(state.vpn_body())
}

async fn vpn_disconnect(State(state): State<Arc<StubState>>) -> Json<Value> {
    state.vpn_connected.store(false, Ordering::Relaxed);
    tracing::info!("vpn disconnected");
    Json(state.vpn_body())
}
