//! Capability snapshot and normalization of raw probe reports.
//!
//! This module is intentionally free of I/O, async, and external layer imports.

use serde::Serialize;

use preboot_common::RawCapabilityReport;

/// Operating system family.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OsFamily {
    Linux,
    Macos,
    Windows,
    #[default]
    Unknown,
}

impl OsFamily {
    /// Classify a free-form platform name (`"Linux"`, `"darwin"`, `"win32"`, …).
    #[must_use]
    pub fn classify(raw: &str) -> Self {
        let name = raw.to_lowercase();
        if name.contains("linux") {
            Self::Linux
        } else if name.contains("darwin") || name.contains("mac") {
            Self::Macos
        } else if name.contains("win") {
            Self::Windows
        } else {
            Self::Unknown
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Linux => "Linux",
            Self::Macos => "macOS",
            Self::Windows => "Windows",
            Self::Unknown => "Unknown platform",
        }
    }
}

/// CPU architecture.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub enum CpuArch {
    #[serde(rename = "x86_64")]
    X86_64,
    #[serde(rename = "arm64")]
    Arm64,
    #[default]
    #[serde(rename = "unknown")]
    Unknown,
}

impl CpuArch {
    #[must_use]
    pub fn classify(raw: &str) -> Self {
        if raw.contains("arm") {
            Self::Arm64
        } else if raw.contains("64") {
            Self::X86_64
        } else {
            Self::Unknown
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::X86_64 => "x86_64",
            Self::Arm64 => "arm64",
            Self::Unknown => "unknown",
        }
    }
}

/// GPU facts. `present == None` means the probe could not tell.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct GpuFacts {
    pub present: Option<bool>,
    pub vram_total_gb: Option<f64>,
    pub vram_free_gb: Option<f64>,
    pub load_pct: Option<f64>,
    pub name: Option<String>,
}

/// Normalized machine facts. Unknown values are `None`, never zero.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct CapabilitySnapshot {
    pub os: OsFamily,
    pub arch: CpuArch,
    pub cpu_name: Option<String>,
    pub cpu_cores: Option<u32>,
    pub cpu_load_pct: Option<f64>,
    pub ram_total_gb: Option<f64>,
    pub ram_free_gb: Option<f64>,
    pub ram_used_pct: Option<f64>,
    pub gpu: GpuFacts,
    /// Whether a compatible local runtime backend is reachable.
    pub backend_available: bool,
}

impl CapabilitySnapshot {
    /// Normalize an untrusted probe report.
    #[must_use]
    pub fn from_report(raw: &RawCapabilityReport) -> Self {
        let platform = raw.platform.clone().unwrap_or_default();
        let cpu = raw.cpu.clone().unwrap_or_default();
        let memory = raw.memory.clone().unwrap_or_default();
        let gpu = raw.gpu.clone().unwrap_or_default();

        Self {
            os: OsFamily::classify(platform.os.as_deref().unwrap_or("unknown")),
            arch: CpuArch::classify(platform.arch.as_deref().unwrap_or("unknown")),
            cpu_name: None,
            cpu_cores: cpu.cores.and_then(core_count),
            cpu_load_pct: cpu.load_pct,
            ram_total_gb: memory.total_gb,
            ram_free_gb: memory.free_gb,
            ram_used_pct: memory.used_pct,
            gpu: GpuFacts {
                present: gpu.present,
                vram_total_gb: gpu.vram_total_gb,
                vram_free_gb: gpu.vram_free_gb,
                load_pct: gpu.load_pct,
                name: gpu.name,
            },
            backend_available: false,
        }
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn core_count(cores: f64) -> Option<u32> {
    (cores.is_finite() && cores >= 0.0 && cores <= f64::from(u32::MAX)).then(|| cores.floor() as u32)
}
