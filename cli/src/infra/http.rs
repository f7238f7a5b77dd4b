//! Infrastructure implementation of the `PrebootApi` port over HTTP.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::debug;

use preboot_common::endpoints;
use preboot_common::{
    HostsPayload, ProbePayload, RawCapabilityReport, RawPeer, SessionInfo, VpnAction,
};

use crate::application::ports::PrebootApi;
use crate::domain::error::FlowError;
use crate::domain::{LaunchRequest, validate_base_url};

/// reqwest-backed client for the preboot service.
#[derive(Debug, Clone)]
pub struct HttpPrebootApi {
    base_url: String,
    client: Client,
}

impl HttpPrebootApi {
    /// Build a client for `base_url` with a per-request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is missing or not HTTP(S), or the
    /// HTTP client cannot be built.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        validate_base_url(base_url)?;
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("preboot/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("building HTTP client")?;
        Ok(Self {
            base_url: base_url.trim().trim_end_matches('/').to_string(),
            client,
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn send(&self, path: &str, request: RequestBuilder) -> Result<Response> {
        debug!(path, "preboot request");
        let response = request
            .send()
            .await
            .with_context(|| format!("cannot reach preboot service at {}", self.base_url))?;
        debug!(path, status = response.status().as_u16(), "preboot response");
        Ok(response)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self.send(path, self.client.get(self.url(path))).await?;
        read_json(path, response).await
    }
}

async fn read_json<T: DeserializeOwned>(path: &str, response: Response) -> Result<T> {
    let status = response.status();
    if !status.is_success() {
        return Err(FlowError::UnexpectedStatus {
            endpoint: path.to_string(),
            status: status.as_u16(),
        }
        .into());
    }
    response
        .json::<T>()
        .await
        .with_context(|| format!("parsing {path} response"))
}

impl PrebootApi for HttpPrebootApi {
    async fn engine_status(&self) -> Result<Value> {
        self.get_json(endpoints::STATUS).await
    }

    async fn trusted_hosts(&self) -> Result<Vec<RawPeer>> {
        let payload: HostsPayload = self.get_json(endpoints::PAIRING_ONLINE).await?;
        Ok(payload.into_peers())
    }

    async fn scan_network(&self) -> Result<Vec<RawPeer>> {
        let payload: HostsPayload = self.get_json(endpoints::NETWORK_SCAN).await?;
        Ok(payload.into_peers())
    }

    async fn probe_host(&self, target: &str) -> Result<Option<RawPeer>> {
        let path = endpoints::HOST_PROBE;
        let request = self
            .client
            .get(self.url(path))
            .query(&[("target", target)]);
        let response = self.send(path, request).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let payload: ProbePayload = read_json(path, response).await?;
        Ok(payload.host)
    }

    async fn system_verify(&self) -> Result<RawCapabilityReport> {
        self.get_json(endpoints::SYSTEM_VERIFY).await
    }

    async fn vpn(&self, action: VpnAction) -> Result<Map<String, Value>> {
        let path = endpoints::vpn(action);
        let url = self.url(&path);
        let request = if action.is_query() {
            self.client.get(url)
        } else {
            self.client.post(url)
        };
        let response = self.send(&path, request).await?;
        let body: Value = read_json(&path, response).await?;
        Ok(match body {
            Value::Object(map) => map,
            _ => Map::new(),
        })
    }

    async fn session_info(&self) -> Result<SessionInfo> {
        self.get_json(endpoints::SESSION).await
    }

    async fn decide(&self, request: &LaunchRequest) -> Result<()> {
        let path = endpoints::DECIDE;
        let response = self
            .send(path, self.client.post(self.url(path)).json(request))
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FlowError::DecideRejected {
                status: status.as_u16(),
            }
            .into());
        }
        Ok(())
    }

    async fn commit(&self, request: &LaunchRequest) -> Result<()> {
        let path = endpoints::COMMIT;
        let response = self
            .send(path, self.client.post(self.url(path)).json(request))
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FlowError::UnexpectedStatus {
                endpoint: path.to_string(),
                status: status.as_u16(),
            }
            .into());
        }
        Ok(())
    }
}
