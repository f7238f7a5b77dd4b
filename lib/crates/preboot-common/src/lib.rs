pub mod config;
pub mod endpoints;
pub mod loose;
pub mod types;

pub use config::StubServerConfig;
pub use types::*;
