//! Peer records, registry merge, and status derivation.
//!
//! Pure functions only. Peer identity is assigned once on ingest and never
//! recomputed, so merges and patches key on `id` alone.

use std::collections::HashMap;

use serde::Serialize;
use uuid::Uuid;

use preboot_common::{LastSeen, PeerPairing, PeerResources, PeerStatus, RawPeer};

/// A normalized peer, as merged and displayed.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PeerRecord {
    pub id: String,
    pub hostname: Option<String>,
    pub address: Option<String>,
    pub online: Option<bool>,
    pub resources: Option<PeerResources>,
    pub status: Option<PeerStatus>,
    pub latency_ms: Option<f64>,
    pub last_seen: Option<LastSeen>,
    pub pairing: Option<PeerPairing>,
}

impl PeerRecord {
    /// Normalize an untrusted discovery entry.
    ///
    /// Identity comes from `host_id`, then `id`, then the best network
    /// address. Entries with neither get a freshly generated id.
    #[must_use]
    pub fn from_raw(raw: RawPeer) -> Self {
        let address = raw
            .ip
            .or(raw.address)
            .or(raw.host)
            .or_else(|| raw.hostname.clone());
        let id = raw
            .host_id
            .or(raw.id)
            .or_else(|| address.clone())
            .unwrap_or_else(generate_peer_id);
        let online = match (raw.online, raw.status.as_deref()) {
            (Some(flag), _) => Some(flag),
            (None, Some(status)) => Some(status == "online"),
            (None, None) => None,
        };

        Self {
            id,
            hostname: raw.hostname,
            address,
            online,
            resources: raw.resources,
            status: raw.status.and_then(|s| s.parse().ok()),
            latency_ms: raw.latency_ms,
            last_seen: raw.last_seen,
            pairing: raw.pairing,
        }
    }

    #[must_use]
    pub fn display_name(&self) -> &str {
        self.hostname.as_deref().unwrap_or("unknown")
    }

    /// Paired either by status or by the nested confirmation flag.
    #[must_use]
    pub fn is_paired(&self) -> bool {
        self.status == Some(PeerStatus::Paired)
            || self.pairing.as_ref().and_then(|p| p.paired) == Some(true)
    }

    /// Online and reporting available resources.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.online == Some(true)
            && self.resources.as_ref().and_then(|r| r.available) == Some(true)
    }

    /// Probe target: the network address, else the identity.
    #[must_use]
    pub fn probe_target(&self) -> &str {
        self.address.as_deref().unwrap_or(&self.id)
    }

    /// Take every observed field from a fresher record of the same peer.
    ///
    /// A field the fresh record leaves out is cleared. `pairing` is only
    /// reported by the trusted registry, so it survives a record without one.
    pub fn refresh(&mut self, fresh: &Self) {
        let pairing = fresh.pairing.clone().or_else(|| self.pairing.take());
        *self = Self {
            id: std::mem::take(&mut self.id),
            pairing,
            ..fresh.clone()
        };
    }

    /// Apply a field-level patch. The identity is never touched.
    pub fn apply(&mut self, patch: &HostPatch) {
        if let Some(v) = &patch.hostname {
            self.hostname = Some(v.clone());
        }
        if let Some(v) = &patch.address {
            self.address = Some(v.clone());
        }
        if let Some(v) = patch.online {
            self.online = Some(v);
        }
        if let Some(v) = &patch.resources {
            self.resources = Some(v.clone());
        }
        if let Some(v) = patch.status {
            self.status = Some(v);
        }
        if let Some(v) = patch.latency_ms {
            self.latency_ms = Some(v);
        }
        if let Some(v) = &patch.last_seen {
            self.last_seen = Some(v.clone());
        }
        if let Some(v) = &patch.pairing {
            self.pairing = Some(v.clone());
        }
    }
}

/// Field-level patch applied by identity. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HostPatch {
    pub hostname: Option<String>,
    pub address: Option<String>,
    pub online: Option<bool>,
    pub resources: Option<PeerResources>,
    pub status: Option<PeerStatus>,
    pub latency_ms: Option<f64>,
    pub last_seen: Option<LastSeen>,
    pub pairing: Option<PeerPairing>,
}

impl HostPatch {
    /// Marks a peer that failed to answer a probe.
    #[must_use]
    pub fn unreachable() -> Self {
        Self {
            online: Some(false),
            resources: Some(PeerResources {
                available: Some(false),
                ..PeerResources::default()
            }),
            ..Self::default()
        }
    }
}

/// Merge trusted and discovered peers by identity.
///
/// Trusted entries are inserted first, then each discovered entry refreshes
/// the record with its id (see [`PeerRecord::refresh`]). Output keeps
/// first-appearance order and is idempotent: merging the same discovered set
/// twice yields the same registry.
#[must_use]
pub fn merge_hosts(trusted: &[PeerRecord], discovered: &[PeerRecord]) -> Vec<PeerRecord> {
    let mut merged: Vec<PeerRecord> = Vec::with_capacity(trusted.len() + discovered.len());
    let mut index: HashMap<String, usize> = HashMap::new();

    for peer in trusted.iter().chain(discovered) {
        match index.get(&peer.id).copied() {
            Some(slot) => merged[slot].refresh(peer),
            None => {
                index.insert(peer.id.clone(), merged.len());
                merged.push(peer.clone());
            }
        }
    }
    merged
}

/// Derive the pairing status shown for a peer.
#[must_use]
pub fn apply_status(peer: &PeerRecord) -> PeerRecord {
    let status = if peer.is_paired() {
        if peer.online == Some(false) {
            PeerStatus::Offline
        } else {
            PeerStatus::Paired
        }
    } else if peer.status == Some(PeerStatus::Pairing) {
        PeerStatus::Pairing
    } else {
        PeerStatus::Available
    };
    PeerRecord {
        status: Some(status),
        ..peer.clone()
    }
}

/// Fresh identity for a peer that reported neither id nor address.
#[must_use]
pub fn generate_peer_id() -> String {
    format!("peer-{}", Uuid::new_v4())
}
