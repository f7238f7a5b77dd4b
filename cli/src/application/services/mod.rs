//! Application services: use-case orchestration.
//!
//! Each service module implements a single use-case by composing domain logic
//! with port trait calls. Services import only from `crate::domain` and
//! `crate::application::ports`, never from `crate::infra`, `crate::commands`,
//! or `crate::output`.

pub mod bootstrap_flow;
pub mod config_service;
pub mod readiness;
pub mod ui_adapter;

pub use bootstrap_flow::{BootstrapFlow, spawn_best_effort};
pub use ui_adapter::{ConfirmOutcome, UiAdapter};
