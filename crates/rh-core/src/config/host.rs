//! Host configuration: coordinator, session listeners and migration

use serde::{Deserialize, Serialize};
use std::time::Duration;

use rh_protocol::DEFAULT_MAX_LINE_LENGTH;

use super::serde_utils::duration_secs;
use crate::error::ConfigError;

/// Configuration for a roamhost coordinator process
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// Interface the coordinator and session listeners bind to
    pub bind_host: String,

    /// Well-known coordinator port
    pub coordinator_port: u16,

    /// Host name written into pages so clients know where to reconnect
    pub advertised_host: String,

    /// Answer `/favicon.ico` probes with 404 instead of allocating a session
    pub ignore_favicon: bool,

    /// Maximum accepted request line length in bytes
    pub max_request_line: usize,

    /// Session listener settings
    pub session: SessionConfig,

    /// Migration destination settings
    pub migration: MigrationConfig,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            bind_host: "0.0.0.0".to_string(),
            coordinator_port: 1565,
            advertised_host: "localhost".to_string(),
            ignore_favicon: true,
            max_request_line: DEFAULT_MAX_LINE_LENGTH,
            session: SessionConfig::default(),
            migration: MigrationConfig::default(),
        }
    }
}

impl HostConfig {
    /// Address the coordinator listens on
    pub fn coordinator_address(&self) -> String {
        format!("{}:{}", self.bind_host, self.coordinator_port)
    }

    /// Address a session listener on `port` binds to
    pub fn session_address(&self, port: u16) -> String {
        format!("{}:{}", self.bind_host, port)
    }

    /// Host name of the coordinator sessions migrate to
    pub fn migration_host(&self) -> &str {
        self.migration
            .host
            .as_deref()
            .unwrap_or(&self.advertised_host)
    }

    /// `host:port` of the coordinator sessions migrate to
    pub fn migration_target(&self) -> String {
        format!(
            "{}:{}",
            self.migration_host(),
            self.migration.port.unwrap_or(self.coordinator_port)
        )
    }

    /// Reject settings the host cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.session.first_port == 0 {
            return Err(ConfigError::Invalid(
                "session.first_port must be non-zero".to_string(),
            ));
        }
        if self.session.max_bind_attempts == 0 {
            return Err(ConfigError::Invalid(
                "session.max_bind_attempts must be at least 1".to_string(),
            ));
        }
        if self.session.max_workers == Some(0) {
            return Err(ConfigError::Invalid(
                "session.max_workers must be at least 1 when set".to_string(),
            ));
        }
        if self.max_request_line == 0 {
            return Err(ConfigError::Invalid(
                "max_request_line must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Session listener settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// First port handed out to a session
    pub first_port: u16,

    /// Allocations tried before a session request is refused
    pub max_bind_attempts: u32,

    /// Concurrent request workers per session (unbounded when unset)
    pub max_workers: Option<usize>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            first_port: 3001,
            max_bind_attempts: 16,
            max_workers: None,
        }
    }
}

/// Where and how sessions migrate
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MigrationConfig {
    /// Destination coordinator host (defaults to the advertised host)
    pub host: Option<String>,

    /// Destination coordinator port (defaults to the coordinator port)
    pub port: Option<u16>,

    /// How long to wait for the destination to allocate a port
    #[serde(with = "duration_secs")]
    pub timeout: Duration,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            host: None,
            port: None,
            timeout: Duration::from_secs(30),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = HostConfig::default();
        assert_eq!(config.coordinator_port, 1565);
        assert_eq!(config.session.first_port, 3001);
        assert_eq!(config.coordinator_address(), "0.0.0.0:1565");
        assert_eq!(config.session_address(3001), "0.0.0.0:3001");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_migration_target_defaults_to_same_host() {
        let config = HostConfig::default();
        assert_eq!(config.migration_host(), "localhost");
        assert_eq!(config.migration_target(), "localhost:1565");
    }

    #[test]
    fn test_migration_target_override() {
        let mut config = HostConfig::default();
        config.migration.host = Some("10.0.0.7".to_string());
        config.migration.port = Some(2565);
        assert_eq!(config.migration_target(), "10.0.0.7:2565");
    }

    #[test]
    fn test_validate_rejects_zero_workers() {
        let mut config = HostConfig::default();
        config.session.max_workers = Some(0);
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }
}
