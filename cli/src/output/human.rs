//! Human-readable terminal renderer.

use std::path::Path;

use owo_colors::OwoColorize as _;
use serde_json::Value;

use preboot_common::{LastSeen, PeerStatus};

use crate::domain::config::{PrebootConfig, VALID_CONFIG_KEYS};
use crate::domain::context::VpnState;
use crate::domain::policy::RuntimeStatus;
use crate::domain::{Gates, LocalSummary, PeerRecord, RuntimeEvaluation, Session};
use crate::output::OutputContext;

/// Renders domain types as human-readable terminal output using `OutputContext`.
pub struct HumanRenderer<'a> {
    ctx: &'a OutputContext,
}

impl<'a> HumanRenderer<'a> {
    /// Create a new `HumanRenderer` wrapping the given output context.
    #[must_use]
    pub fn new(ctx: &'a OutputContext) -> Self {
        Self { ctx }
    }

    pub fn render_version(&self, version: &str) {
        if self.ctx.quiet {
            return;
        }
        println!("preboot {version}");
    }

    /// Engine status is opaque; top-level scalars are shown as key/value rows.
    pub fn render_engine_status(&self, status: &Value) {
        self.ctx.header("Engine:");
        match status {
            Value::Object(map) if !map.is_empty() => {
                for (key, value) in map {
                    self.ctx.kv(&format!("{key}:"), &scalar_display(value));
                }
            }
            other => self.ctx.kv("status:", &scalar_display(other)),
        }
    }

    pub fn render_peers(&self, title: &str, peers: &[PeerRecord], selected: Option<&str>) {
        if self.ctx.quiet {
            return;
        }
        println!();
        self.ctx.header(title);
        if peers.is_empty() {
            println!("    {}", "(none)".style(self.ctx.styles.dim));
            return;
        }
        for peer in peers {
            let marker = if selected == Some(peer.id.as_str()) {
                format!("{}", "›".style(self.ctx.styles.selected))
            } else {
                " ".to_string()
            };
            println!(
                "  {marker} {} {}",
                peer_columns(peer),
                self.ctx.readiness(peer.is_ready())
            );
        }
    }

    pub fn render_peer(&self, peer: &PeerRecord) {
        self.ctx.header(peer.display_name());
        self.ctx.kv("id:", &peer.id);
        self.ctx
            .kv("address:", peer.address.as_deref().unwrap_or("?"));
        self.ctx.kv("status:", peer_status_display(peer));
        self.ctx.kv("ready:", yes_no(peer.is_ready()));
        if let Some(resources) = &peer.resources {
            self.ctx.kv(
                "ram free:",
                &format!("{} GB", one_decimal(resources.ram_free_gb)),
            );
            self.ctx.kv(
                "vram free:",
                &format!("{} GB", one_decimal(resources.vram_free_gb)),
            );
        }
        if let Some(latency) = peer.latency_ms {
            self.ctx.kv("latency:", &format!("{latency:.0} ms"));
        }
        if let Some(seen) = &peer.last_seen {
            self.ctx.kv("last seen:", &last_seen_display(seen));
        }
    }

    pub fn render_local_summary(&self, summary: &LocalSummary) {
        if self.ctx.quiet {
            return;
        }
        println!();
        println!(
            "  {} {}",
            "Local system:".style(self.ctx.styles.header),
            self.ctx.verdict_badge(summary.status)
        );
        println!("  {}", summary.verdict);
        println!();
        for row in &summary.details {
            self.ctx.kv(&format!("{}:", row.label), &row.value);
        }
        for reason in &summary.reasons {
            self.ctx.error(reason);
        }
        for note in &summary.notes {
            self.ctx.warn(note);
        }
    }

    pub fn render_gates(&self, gates: Gates) {
        if self.ctx.quiet {
            return;
        }
        println!();
        self.ctx.header("Gates:");
        self.ctx.kv("launch:", yes_no(gates.can_launch));
        self.ctx
            .kv("execution:", yes_no(gates.can_configure_execution));
    }

    pub fn render_runtime_evaluation(&self, eval: &RuntimeEvaluation) {
        if self.ctx.quiet {
            return;
        }
        println!();
        let label = match eval.status {
            RuntimeStatus::Ready => "ready",
            RuntimeStatus::Limited => "limited",
            RuntimeStatus::Blocked => "blocked",
        };
        self.ctx.header(&format!("Runtime (advisory): {label}"));
        for reason in &eval.reasons {
            self.ctx.warn(reason);
        }
        for note in &eval.notes {
            self.ctx.info(note);
        }
    }

    pub fn render_vpn(&self, vpn: &VpnState) {
        self.ctx.header("VPN:");
        self.ctx.kv("connected:", yes_no(vpn.connected));
        self.ctx.kv("required:", yes_no(vpn.required));
        for (key, value) in &vpn.extra {
            self.ctx.kv(&format!("{key}:"), &scalar_display(value));
        }
    }

    pub fn render_session(&self, session: Option<&Session>) {
        let Some(session) = session else {
            self.ctx.info("No active session.");
            return;
        };
        self.ctx.header("Session:");
        self.ctx.kv("mode:", &session.mode.to_string());
        self.ctx
            .kv("session id:", session.session_id.as_deref().unwrap_or("-"));
        self.ctx
            .kv("runtime id:", session.runtime_id.as_deref().unwrap_or("-"));
        self.ctx.kv(
            "started:",
            &session.started_at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        );
    }

    /// Render the current preboot configuration.
    pub fn render_config(&self, config: &PrebootConfig, path: &Path) {
        println!();
        println!(
            "  {}",
            format!("Configuration ({})", path.display()).style(self.ctx.styles.header)
        );
        println!();
        for key in VALID_CONFIG_KEYS {
            let value = config.get(key).unwrap_or_else(|| "(not set)".to_string());
            println!("  {:<30} {value}", format!("{key}:"));
        }
        println!();
        println!("  {}", "Environment:".style(self.ctx.styles.bold));
        for var in ["PREBOOT_CONFIG", "PREBOOT_BASE_URL", "PREBOOT_RUNTIME_ID", "NO_COLOR"] {
            println!(
                "    {:<20} {}",
                format!("{var}:"),
                std::env::var(var).unwrap_or_else(|_| "(not set)".to_string())
            );
        }
        println!();
    }
}

/// Status word for a peer: explicit status, else online flag, else `unknown`.
#[must_use]
pub fn peer_status_display(peer: &PeerRecord) -> &'static str {
    match (peer.status, peer.online) {
        (Some(PeerStatus::Available), _) => "available",
        (Some(PeerStatus::Pairing), _) => "pairing",
        (Some(PeerStatus::Paired), _) => "paired",
        (Some(PeerStatus::Offline), _) | (None, Some(false)) => "offline",
        (None, Some(true)) => "online",
        (None, None) => "unknown",
    }
}

/// One line per peer: name, address, status, readiness.
#[must_use]
pub fn format_peer_line(peer: &PeerRecord) -> String {
    let ready = if peer.is_ready() { "ready" } else { "not ready" };
    format!("{} {ready}", peer_columns(peer))
}

fn peer_columns(peer: &PeerRecord) -> String {
    format!(
        "{:<20} {:<16} {:<10}",
        peer.display_name(),
        peer.address.as_deref().unwrap_or("?"),
        peer_status_display(peer),
    )
}

fn yes_no(flag: bool) -> &'static str {
    if flag { "yes" } else { "no" }
}

fn one_decimal(value: Option<f64>) -> String {
    value.map_or_else(|| "?".to_string(), |v| format!("{v:.1}"))
}

fn last_seen_display(seen: &LastSeen) -> String {
    match seen {
        LastSeen::Epoch(secs) => {
            #[allow(clippy::cast_possible_truncation)]
            let whole = *secs as i64;
            chrono::DateTime::from_timestamp(whole, 0).map_or_else(
                || secs.to_string(),
                |at| at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
            )
        }
        LastSeen::Text(text) => text.clone(),
    }
}

fn scalar_display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "-".to_string(),
        other => other.to_string(),
    }
}
