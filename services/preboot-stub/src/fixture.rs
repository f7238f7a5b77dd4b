//! Canned responses served by the stub.
//!
//! A fixture file may override any subset of the sections; missing sections
//! fall back to the built-in defaults.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::{Value, json};

/// Response bodies, one per endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Fixture {
    pub status: Value,
    /// `hosts` array for `/preboot/pairing/online`.
    pub trusted: Vec<Value>,
    /// `hosts` array for `/preboot/network/scan`.
    pub scan: Vec<Value>,
    /// Probe answers keyed by target. Unknown targets fall back to any
    /// trusted or scanned host whose id or address matches, else 404.
    pub probes: HashMap<String, Value>,
    pub verify: Value,
    pub session: Value,
    pub vpn: Value,
}

impl Default for Fixture {
    fn default() -> Self {
        Self {
            status: json!({"engine": "idle", "version": env!("CARGO_PKG_VERSION")}),
            trusted: vec![json!({
                "host_id": "lab-1",
                "hostname": "lab-workstation",
                "ip": "192.168.1.20",
                "online": true,
                "pairing": {"paired": true},
                "resources": {"available": true, "ram_free_gb": 48.0, "vram_free_gb": 20.0},
                "latency_ms": 3.2,
                "last_seen": 1_760_000_000
            })],
            scan: vec![json!({
                "ip": "192.168.1.31",
                "hostname": "spare-box",
                "online": true,
                "status": "available",
                "resources": {"available": true, "ram_free_gb": 12.0, "vram_free_gb": 0.0}
            })],
            probes: HashMap::new(),
            verify: json!({
                "platform": {"os": "linux", "arch": "x86_64"},
                "cpu": {"cores": 8, "load_pct": 12.5},
                "memory": {"total_gb": 32.0, "free_gb": 20.0, "used_pct": 37.5},
                "gpu": {"present": true, "vram_total_gb": 12.0, "vram_free_gb": 10.0, "name": "Stub GPU"}
            }),
            session: json!({"session_id": "stub-session"}),
            vpn: json!({"connected": false, "required": false}),
        }
    }
}

impl Fixture {
    /// Load a fixture file, or the defaults when `path` is `None`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid JSON.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read fixture {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("cannot parse fixture {}", path.display()))
    }

    /// Answer for a probe of `target`.
    #[must_use]
    pub fn probe(&self, target: &str) -> Option<Value> {
        if let Some(host) = self.probes.get(target) {
            return Some(host.clone());
        }
        self.trusted
            .iter()
            .chain(&self.scan)
            .find(|host| {
                ["host_id", "id", "ip", "address", "hostname"]
                    .iter()
                    .any(|key| host.get(key).and_then(Value::as_str) == Some(target))
            })
            .cloned()
    }
}
