//! Human-readable summary of a local verification.

use serde::Serialize;

use crate::domain::capability::{CapabilitySnapshot, OsFamily};
use crate::domain::policy::{LOCAL_REQUIREMENTS, PolicyStatus, PolicyVerdict};

/// GPU load at or above which the GPU is reported busy.
const GPU_BUSY_PCT: f64 = 70.0;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct DetailRow {
    pub label: &'static str,
    pub value: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct LocalSummary {
    pub status: PolicyStatus,
    pub platform: String,
    pub compute: String,
    pub memory: String,
    pub verdict: String,
    pub reasons: Vec<String>,
    pub notes: Vec<String>,
    pub details: Vec<DetailRow>,
}

#[must_use]
pub fn build_local_summary(profile: &CapabilitySnapshot, verdict: &PolicyVerdict) -> LocalSummary {
    let gpu = &profile.gpu;
    let mut notes = verdict.warnings.clone();

    if gpu.present == Some(true) && gpu.load_pct.is_some_and(|load| load >= GPU_BUSY_PCT) {
        notes.push("GPU busy.".to_string());
    }
    if gpu.present == Some(false) {
        notes.push("CPU-only fallback enabled.".to_string());
    }
    if let Some(free) = gpu
        .vram_free_gb
        .filter(|free| gpu.present == Some(true) && *free < LOCAL_REQUIREMENTS.min_gpu_vram_gb)
    {
        notes.push(format!("VRAM insufficient ({} GB free).", number(Some(free))));
    }

    let platform = platform(profile);
    let memory = memory(profile.ram_free_gb, profile.ram_total_gb);
    let details = details(profile, &platform, &memory);

    LocalSummary {
        status: verdict.status,
        platform,
        compute: compute(profile),
        memory,
        verdict: verdict_sentence(verdict.status).to_string(),
        reasons: verdict.reasons.clone(),
        notes,
        details,
    }
}

fn verdict_sentence(status: PolicyStatus) -> &'static str {
    match status {
        PolicyStatus::Approved => "Local runtime is fully supported on this machine.",
        PolicyStatus::Limited => "Local runtime can run, but performance will be limited.",
        PolicyStatus::Blocked => "Local runtime cannot be launched on this machine.",
    }
}

fn platform(profile: &CapabilitySnapshot) -> String {
    let name = match profile.os {
        OsFamily::Unknown => "Unknown platform",
        os => os.label(),
    };
    format!("{name} ({})", profile.arch.as_str())
}

fn memory(free: Option<f64>, total: Option<f64>) -> String {
    let used = match (free, total) {
        (Some(free), Some(total)) if total > 0.0 => Some((1.0 - free / total) * 100.0),
        _ => None,
    };
    format!(
        "{} GB free / {} GB total ({})",
        number(free),
        number(total),
        percent(used)
    )
}

fn compute(profile: &CapabilitySnapshot) -> String {
    let gpu = &profile.gpu;
    match gpu.present {
        Some(true) => {
            let vram = gpu
                .vram_total_gb
                .map_or_else(|| "VRAM ?".to_string(), |total| format!("{} GB VRAM", number(Some(total))));
            format!("GPU ({}, {vram})", gpu_name(profile))
        }
        Some(false) => "CPU-only".to_string(),
        None => "Unknown".to_string(),
    }
}

fn gpu_name(profile: &CapabilitySnapshot) -> &str {
    profile
        .gpu
        .name
        .as_deref()
        .filter(|name| !name.is_empty())
        .unwrap_or("Unknown GPU")
}

fn details(profile: &CapabilitySnapshot, platform: &str, memory: &str) -> Vec<DetailRow> {
    let gpu = &profile.gpu;
    let cores = number(profile.cpu_cores.map(f64::from));
    let cpu = match profile.cpu_name.as_deref() {
        Some(name) => format!("{name} ({cores} cores)"),
        None => format!("{cores} cores"),
    };
    let gpu_row = match gpu.present {
        Some(true) => gpu_name(profile).to_string(),
        Some(false) => "None detected".to_string(),
        None => "Unknown".to_string(),
    };
    let vram = match (gpu.present, gpu.vram_free_gb, gpu.vram_total_gb) {
        (Some(true), Some(free), Some(total)) => format!(
            "{} GB free / {} GB total",
            number(Some(free)),
            number(Some(total))
        ),
        (Some(true), None, Some(total)) => format!("{} GB total", number(Some(total))),
        (Some(true), _, None) => "?".to_string(),
        _ => "Not available".to_string(),
    };
    let gpu_load = match (gpu.present, gpu.load_pct) {
        (Some(false), _) => "Not available".to_string(),
        (_, Some(load)) => percent(Some(load)),
        (_, None) => "Unknown".to_string(),
    };

    vec![
        DetailRow { label: "Platform", value: platform.to_string() },
        DetailRow { label: "CPU", value: cpu },
        DetailRow {
            label: "CPU Load",
            value: profile
                .cpu_load_pct
                .map_or_else(|| "Unknown".to_string(), |load| percent(Some(load))),
        },
        DetailRow { label: "GPU", value: gpu_row },
        DetailRow { label: "VRAM", value: vram },
        DetailRow { label: "GPU Load", value: gpu_load },
        DetailRow { label: "Memory", value: memory.to_string() },
    ]
}

/// One decimal place, `?` when unknown.
fn number(value: Option<f64>) -> String {
    value
        .filter(|v| v.is_finite())
        .map_or_else(|| "?".to_string(), |v| format!("{:.1}", (v * 10.0).round() / 10.0))
}

fn percent(value: Option<f64>) -> String {
    value
        .filter(|v| v.is_finite())
        .map_or_else(|| "?%".to_string(), |v| format!("{v:.1}%"))
}
