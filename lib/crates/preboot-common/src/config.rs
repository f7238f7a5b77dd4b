use serde::Deserialize;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Stub preboot service configuration
#[derive(Debug, Deserialize)]
pub struct StubServerConfig {
    /// Listen address (default: 127.0.0.1:7040)
    /// The stub answers launch decisions without authentication; keep it on
    /// loopback unless the network is trusted.
    #[serde(default = "default_stub_addr")]
    pub listen_addr: SocketAddr,

    /// Optional JSON fixture replacing the built-in canned responses
    #[serde(default)]
    pub fixture: Option<PathBuf>,

    /// Artificial latency added to the scan endpoint, in milliseconds
    #[serde(default)]
    pub scan_delay_ms: u64,

    /// When set, `/preboot/decide` answers 503
    #[serde(default)]
    pub refuse_decide: bool,
}

fn default_stub_addr() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 7040))
}

impl Default for StubServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_stub_addr(),
            fixture: None,
            scan_delay_ms: 0,
            refuse_decide: false,
        }
    }
}
