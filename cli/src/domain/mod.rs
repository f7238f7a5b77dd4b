//! Domain layer: pure business logic, types, and validation.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All functions are synchronous and take data in, returning data out.

pub mod capability;
pub mod config;
pub mod context;
pub mod error;
pub mod host;
pub mod policy;
pub mod session;
pub mod summary;
pub mod ui;

pub use capability::{CapabilitySnapshot, CpuArch, GpuFacts, OsFamily};
pub use config::{PrebootConfig, validate_base_url, validate_config_key, validate_config_value};
pub use context::{LaunchRequest, OpState, PrebootContext, Resources, ResourcesPatch};
pub use error::{ConfigError, FlowError, ParseError, SessionError};
pub use host::{HostPatch, PeerRecord, apply_status, merge_hosts};
pub use policy::{
    LOCAL_REQUIREMENTS, PolicyStatus, PolicyVerdict, RuntimeEvaluation, evaluate_local_policy,
    evaluate_local_runtime,
};
pub use session::{Session, SessionGuard, SessionMode};
pub use summary::{LocalSummary, build_local_summary};
pub use ui::{Gates, UiState, compute_gates, derive_ui_state};
