//! Local capability policy and advisory runtime evaluation.
//!
//! Pure functions only: no I/O, no async, no filesystem access.

use serde::Serialize;

use crate::domain::capability::{CapabilitySnapshot, OsFamily};

// ── Constants ────────────────────────────────────────────────────────────────

/// Free system RAM below which local execution is refused outright.
pub const MIN_RAM_FREE_GB: f64 = 6.0;
/// Free VRAM needed for GPU execution.
pub const MIN_GPU_VRAM_GB: f64 = 6.0;
/// CPU-only execution needs at least this many cores…
pub const CPU_ONLY_MIN_CORES: u32 = 8;
/// …and at least this much free RAM.
pub const CPU_ONLY_MIN_RAM_FREE_GB: f64 = 12.0;

pub const WARN_MEMORY_UNVERIFIED: &str = "System memory could not be verified.";
pub const WARN_CPU_ONLY: &str = "CPU-only execution enabled. Performance will be limited.";
pub const WARN_APPLE_CPU_ONLY: &str =
    "Apple Silicon detected: CPU-only execution may be unstable under heavy load.";
pub const REASON_LOW_RAM: &str = "Insufficient free system RAM";
pub const REASON_BELOW_MINIMUM: &str =
    "System does not meet minimum requirements for safe execution.";

// ── Verdict ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PolicyStatus {
    Approved,
    Limited,
    Blocked,
}

impl PolicyStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Approved => "APPROVED",
            Self::Limited => "LIMITED",
            Self::Blocked => "BLOCKED",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ComputeTarget {
    Gpu,
    Cpu,
}

/// Preferred execution target with its optional fallback.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct ExecutionPlan {
    pub preferred: ComputeTarget,
    pub fallback: Option<ComputeTarget>,
}

/// Outcome of the local capability policy.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PolicyVerdict {
    pub status: PolicyStatus,
    pub reasons: Vec<String>,
    pub warnings: Vec<String>,
    pub execution: Option<ExecutionPlan>,
}

impl PolicyVerdict {
    fn blocked(reason: &str) -> Self {
        Self {
            status: PolicyStatus::Blocked,
            reasons: vec![reason.to_string()],
            warnings: Vec::new(),
            execution: None,
        }
    }

    #[must_use]
    pub fn is_blocked(&self) -> bool {
        self.status == PolicyStatus::Blocked
    }
}

/// Decide whether local execution may be launched on this machine.
///
/// Rules apply in priority order and unknown values always count against the
/// machine: unknown free RAM cannot satisfy the CPU-only threshold and an
/// unknown GPU never approves.
#[must_use]
pub fn evaluate_local_policy(caps: &CapabilitySnapshot) -> PolicyVerdict {
    let mut warnings = Vec::new();

    match caps.ram_free_gb {
        None => warnings.push(WARN_MEMORY_UNVERIFIED.to_string()),
        Some(free) if free < MIN_RAM_FREE_GB => return PolicyVerdict::blocked(REASON_LOW_RAM),
        Some(_) => {}
    }

    let gpu_ready = caps.gpu.present == Some(true)
        && caps.gpu.vram_free_gb.is_some_and(|vram| vram >= MIN_GPU_VRAM_GB);
    if gpu_ready {
        return PolicyVerdict {
            status: PolicyStatus::Approved,
            reasons: Vec::new(),
            warnings,
            execution: Some(ExecutionPlan {
                preferred: ComputeTarget::Gpu,
                fallback: Some(ComputeTarget::Cpu),
            }),
        };
    }

    let cores = caps.cpu_cores.unwrap_or(0);
    let ram_free = caps.ram_free_gb.unwrap_or(0.0);
    if cores >= CPU_ONLY_MIN_CORES && ram_free >= CPU_ONLY_MIN_RAM_FREE_GB {
        warnings.push(WARN_CPU_ONLY.to_string());
        if caps.os == OsFamily::Macos {
            warnings.push(WARN_APPLE_CPU_ONLY.to_string());
        }
        return PolicyVerdict {
            status: PolicyStatus::Limited,
            reasons: Vec::new(),
            warnings,
            execution: Some(ExecutionPlan {
                preferred: ComputeTarget::Cpu,
                fallback: None,
            }),
        };
    }

    PolicyVerdict::blocked(REASON_BELOW_MINIMUM)
}

// ── Advisory runtime evaluation ──────────────────────────────────────────────

/// Minimum machine requirements for running the local runtime.
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct RuntimeRequirements {
    pub min_cpu_cores: u32,
    pub min_ram_free_gb: f64,
    pub recommended_ram_free_gb: f64,
    pub min_gpu_vram_gb: f64,
    pub requires_backend: bool,
    pub gpu_optional: bool,
}

pub const LOCAL_REQUIREMENTS: RuntimeRequirements = RuntimeRequirements {
    min_cpu_cores: 4,
    min_ram_free_gb: 6.0,
    recommended_ram_free_gb: 12.0,
    min_gpu_vram_gb: 6.0,
    requires_backend: true,
    gpu_optional: true,
};

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RuntimeStatus {
    Ready,
    Limited,
    Blocked,
}

/// Advisory readiness of the local runtime. `reasons` are hard failures,
/// `notes` are soft concerns.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RuntimeEvaluation {
    pub status: RuntimeStatus,
    pub reasons: Vec<String>,
    pub notes: Vec<String>,
}

/// Evaluate the snapshot against runtime requirements. Missing data only
/// ever produces notes.
#[must_use]
pub fn evaluate_local_runtime(
    caps: &CapabilitySnapshot,
    req: &RuntimeRequirements,
) -> RuntimeEvaluation {
    let mut reasons = Vec::new();
    let mut notes = Vec::new();

    if req.requires_backend && !caps.backend_available {
        reasons.push("No compatible local runtime backend detected.".to_string());
    }

    match caps.cpu_cores {
        Some(cores) if cores < req.min_cpu_cores => reasons.push(format!(
            "Insufficient CPU cores ({cores} detected, {} required).",
            req.min_cpu_cores
        )),
        Some(_) => {}
        None => notes.push("Unable to determine CPU core count.".to_string()),
    }

    match caps.ram_free_gb {
        Some(free) if free < req.min_ram_free_gb => reasons.push(format!(
            "Insufficient free system memory ({free} GB available, {} GB required).",
            req.min_ram_free_gb
        )),
        Some(free) if free < req.recommended_ram_free_gb => notes.push(
            "System meets minimum requirements but may be resource constrained.".to_string(),
        ),
        Some(_) => {}
        None => notes.push("Unable to determine available system memory.".to_string()),
    }

    let vram_check = caps.gpu.vram_free_gb.or(caps.gpu.vram_total_gb);
    match caps.gpu.present {
        None => notes.push(
            "GPU information unavailable. Falling back to CPU-only evaluation.".to_string(),
        ),
        Some(false) => {
            notes.push("CPU-only execution detected. Performance may be limited.".to_string());
        }
        Some(true) => {
            if let Some(vram) = vram_check.filter(|v| req.min_gpu_vram_gb > 0.0 && *v < req.min_gpu_vram_gb) {
                let label = if caps.gpu.vram_free_gb.is_some() { "free VRAM" } else { "VRAM" };
                notes.push(format!(
                    "GPU {label} below recommended level ({vram} GB, recommended {} GB).",
                    req.min_gpu_vram_gb
                ));
            }
        }
    }

    let status = if !reasons.is_empty() {
        RuntimeStatus::Blocked
    } else if !notes.is_empty() {
        RuntimeStatus::Limited
    } else {
        RuntimeStatus::Ready
    };

    RuntimeEvaluation {
        status,
        reasons,
        notes,
    }
}

// ── Unit tests ───────────────────────────────────────────────────────────────
