//! Endpoint paths of the preboot service, relative to the configured base URL.

use crate::types::VpnAction;

/// Default base URL of the preboot service on the local machine.
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:7040";

/// Engine status snapshot. Response is opaque to the client.
pub const STATUS: &str = "/preboot/status";

/// Previously paired peers that are currently reachable.
/// Response: `{hosts: RawPeer[]}`
pub const PAIRING_ONLINE: &str = "/preboot/pairing/online";

/// On-demand LAN scan.
/// Response: `{hosts: RawPeer[]}`
pub const NETWORK_SCAN: &str = "/preboot/network/scan";

/// Liveness probe of one peer. Query: `target=<id-or-address>`.
/// Response: `{host: RawPeer}` or 404.
pub const HOST_PROBE: &str = "/host/probe";

/// Local capability probe.
/// Response: `RawCapabilityReport`
pub const SYSTEM_VERIFY: &str = "/preboot/system/verify";

/// Current engine session, best-effort.
/// Response: `{session_id, ...}`
pub const SESSION: &str = "/preboot/session";

/// Blocking launch decision. Body: `{mode, topology, host, resources}`.
pub const DECIDE: &str = "/preboot/decide";

/// Best-effort persistence of the launch decision. Same body as `DECIDE`.
pub const COMMIT: &str = "/preboot/commit";

/// Prefix of the VPN endpoints.
pub const VPN_PREFIX: &str = "/vpn";

/// Path for a VPN action, e.g. `/vpn/connect`.
#[must_use]
pub fn vpn(action: VpnAction) -> String {
    format!("{VPN_PREFIX}/{}", action.as_str())
}
