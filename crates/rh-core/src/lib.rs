//! rh-core: Shared configuration and error types for roamhost
//!
//! Used by the host (coordinator and session listeners) and by the CLI.

pub mod config;
pub mod error;

pub use config::HostConfig;
pub use error::{ConfigError, HostError};
