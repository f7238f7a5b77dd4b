use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::loose;

/// Error returned when a vocabulary value is not recognised.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid {kind} '{value}': expected one of {expected}")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
    pub expected: &'static str,
}

macro_rules! vocabulary {
    ($(#[$meta:meta])* $name:ident, $kind:literal { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
        #[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
        #[serde(rename_all = "lowercase")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            /// Wire representation.
            #[must_use]
            pub fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok(Self::$variant),)+
                    other => Err(UnknownVariant {
                        kind: $kind,
                        value: other.to_string(),
                        expected: concat!($($text, " "),+),
                    }),
                }
            }
        }
    };
}

vocabulary!(
    /// Execution venue the user is configuring.
    TopologyMode, "mode" {
        Local => "local",
        Remote => "remote",
        Cloud => "cloud",
    }
);

vocabulary!(
    /// Transport/backend chosen for the session.
    ExecutionBackend, "execution backend" {
        Client => "client",
        Lan => "lan",
        Vpn => "vpn",
    }
);

vocabulary!(
    /// Pairing/liveness status of a peer.
    PeerStatus, "peer status" {
        Available => "available",
        Pairing => "pairing",
        Paired => "paired",
        Offline => "offline",
    }
);

vocabulary!(
    /// VPN exchange kind.
    VpnAction, "vpn action" {
        Connect => "connect",
        Disconnect => "disconnect",
        Status => "status",
    }
);

impl VpnAction {
    /// `status` is a read; the other actions mutate the tunnel.
    #[must_use]
    pub fn is_query(self) -> bool {
        matches!(self, Self::Status)
    }
}

// ── Peers ─────────────────────────────────────────────────────────────────────

/// Resource availability reported for a peer.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PeerResources {
    #[serde(default, deserialize_with = "loose::opt_bool", skip_serializing_if = "Option::is_none")]
    pub available: Option<bool>,
    #[serde(default, deserialize_with = "loose::opt_f64", skip_serializing_if = "Option::is_none")]
    pub ram_free_gb: Option<f64>,
    #[serde(default, deserialize_with = "loose::opt_f64", skip_serializing_if = "Option::is_none")]
    pub vram_free_gb: Option<f64>,
}

/// Nested pairing confirmation attached to some peer payloads.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PeerPairing {
    #[serde(default, deserialize_with = "loose::opt_bool", skip_serializing_if = "Option::is_none")]
    pub paired: Option<bool>,
}

/// Last time a peer was seen: epoch number or timestamp string.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum LastSeen {
    Epoch(f64),
    Text(String),
}

fn opt_last_seen<'de, D>(d: D) -> Result<Option<LastSeen>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(d)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_f64().filter(|f| f.is_finite()).map(LastSeen::Epoch),
        Some(Value::String(s)) if !s.is_empty() => Some(LastSeen::Text(s)),
        _ => None,
    })
}

/// Untrusted peer record as returned by discovery, pairing and probe endpoints.
///
/// Every field is optional and leniently parsed. Normalization into a strict
/// record happens on the client side.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RawPeer {
    #[serde(default, deserialize_with = "loose::opt_string", skip_serializing_if = "Option::is_none")]
    pub host_id: Option<String>,
    #[serde(default, deserialize_with = "loose::opt_string", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "loose::opt_string", skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
    #[serde(default, deserialize_with = "loose::opt_string", skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, deserialize_with = "loose::opt_string", skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(default, deserialize_with = "loose::opt_string", skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
    #[serde(default, deserialize_with = "loose::opt_bool", skip_serializing_if = "Option::is_none")]
    pub online: Option<bool>,
    #[serde(default, deserialize_with = "loose::opt_string", skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "loose::opt_object", skip_serializing_if = "Option::is_none")]
    pub resources: Option<PeerResources>,
    #[serde(default, deserialize_with = "loose::opt_f64", skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<f64>,
    #[serde(default, deserialize_with = "opt_last_seen", skip_serializing_if = "Option::is_none")]
    pub last_seen: Option<LastSeen>,
    #[serde(default, deserialize_with = "loose::opt_object", skip_serializing_if = "Option::is_none")]
    pub pairing: Option<PeerPairing>,
}

/// `{hosts: [...]}` envelope used by the pairing and scan endpoints.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HostsPayload {
    #[serde(default)]
    pub hosts: Option<Value>,
}

impl HostsPayload {
    /// Extract the peer entries, ignoring a non-array `hosts` field and any
    /// entry that is not an object.
    #[must_use]
    pub fn into_peers(self) -> Vec<RawPeer> {
        match self.hosts {
            Some(Value::Array(items)) => items
                .into_iter()
                .filter(Value::is_object)
                .filter_map(|item| serde_json::from_value(item).ok())
                .collect(),
            _ => Vec::new(),
        }
    }
}

/// `{host: {...}}` envelope returned by the probe endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProbePayload {
    #[serde(default, deserialize_with = "loose::opt_object")]
    pub host: Option<RawPeer>,
}

// ── Capability report ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RawPlatform {
    #[serde(default, deserialize_with = "loose::opt_string")]
    pub os: Option<String>,
    #[serde(default, deserialize_with = "loose::opt_string")]
    pub arch: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RawCpu {
    #[serde(default, deserialize_with = "loose::opt_f64")]
    pub cores: Option<f64>,
    #[serde(default, deserialize_with = "loose::opt_f64")]
    pub load_pct: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RawMemory {
    #[serde(default, deserialize_with = "loose::opt_f64")]
    pub total_gb: Option<f64>,
    #[serde(default, deserialize_with = "loose::opt_f64")]
    pub free_gb: Option<f64>,
    #[serde(default, deserialize_with = "loose::opt_f64")]
    pub used_pct: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RawGpu {
    #[serde(default, deserialize_with = "loose::opt_bool")]
    pub present: Option<bool>,
    #[serde(default, deserialize_with = "loose::opt_f64")]
    pub vram_total_gb: Option<f64>,
    #[serde(default, deserialize_with = "loose::opt_f64")]
    pub vram_free_gb: Option<f64>,
    #[serde(default, deserialize_with = "loose::opt_f64")]
    pub load_pct: Option<f64>,
    #[serde(default, deserialize_with = "loose::opt_string")]
    pub name: Option<String>,
}

/// Untrusted local capability report from `/preboot/system/verify`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RawCapabilityReport {
    #[serde(default, deserialize_with = "loose::opt_object")]
    pub platform: Option<RawPlatform>,
    #[serde(default, deserialize_with = "loose::opt_object")]
    pub cpu: Option<RawCpu>,
    #[serde(default, deserialize_with = "loose::opt_object")]
    pub memory: Option<RawMemory>,
    #[serde(default, deserialize_with = "loose::opt_object")]
    pub gpu: Option<RawGpu>,
}

// ── Session / VPN ─────────────────────────────────────────────────────────────

/// Best-effort session information from `/preboot/session`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SessionInfo {
    #[serde(default, deserialize_with = "loose::opt_string")]
    pub session_id: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
