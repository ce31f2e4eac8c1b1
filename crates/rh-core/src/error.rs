//! Core error types for roamhost

use std::path::PathBuf;
use std::time::Duration;

use rh_protocol::ProtocolError;
use thiserror::Error;

/// Errors raised by coordinators, session listeners and workers
#[derive(Error, Debug)]
pub enum HostError {
    /// An allocated session port could not be bound
    #[error("Failed to bind session port {port}: {source}")]
    Bind {
        port: u16,
        #[source]
        source: std::io::Error,
    },

    /// A session already holds this port
    #[error("Session port {0} is already in use by a live session")]
    PortInUse(u16),

    /// The port counter ran past the valid TCP port range
    #[error("Session port range exhausted")]
    PortsExhausted,

    /// Read/write failure on an active connection
    #[error("Connection error: {0}")]
    Connection(#[from] std::io::Error),

    /// Expected token absent or malformed
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Destination coordinator did not answer in time
    #[error("Migration timed out after {0:?}")]
    MigrationTimeout(Duration),

    /// The session's listening socket has already been closed
    #[error("Session on port {0} has been closed")]
    SessionClosed(u16),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl HostError {
    /// Whether the coordinator should retry with a fresh port allocation
    pub fn is_bind_failure(&self) -> bool {
        matches!(self, HostError::Bind { .. } | HostError::PortInUse(_))
    }
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file not found
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    /// Invalid configuration
    #[error("Invalid config: {0}")]
    Invalid(String),

    /// Config file could not be read or written
    #[error("Config file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// TOML parse error
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// TOML serialize error
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
}
