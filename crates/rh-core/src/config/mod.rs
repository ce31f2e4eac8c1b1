//! Configuration management for roamhost

mod host;
pub mod serde_utils;

pub use host::{HostConfig, MigrationConfig, SessionConfig};

use std::io;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

const APP_DIR: &str = "roamhost";
const CONFIG_FILE: &str = "config.toml";

/// Per-user configuration directory, or `./roamhost` when the platform has none
pub fn default_config_dir() -> PathBuf {
    dirs::config_dir().unwrap_or_default().join(APP_DIR)
}

pub fn default_config_path() -> PathBuf {
    default_config_dir().join(CONFIG_FILE)
}

/// Read a host configuration. Missing keys take their defaults.
pub fn load_config(path: &Path) -> Result<HostConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| match source.kind() {
        io::ErrorKind::NotFound => ConfigError::NotFound(path.to_path_buf()),
        _ => ConfigError::Io {
            path: path.to_path_buf(),
            source,
        },
    })?;

    Ok(toml::from_str(&content)?)
}

/// Write `config` to `path`, creating parent directories.
///
/// The file is written next to its final location and renamed into place,
/// so a running coordinator never reads a half-written file.
pub fn save_config(path: &Path, config: &HostConfig) -> Result<(), ConfigError> {
    let content = toml::to_string_pretty(config)?;
    let io_error = |source: io::Error| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(io_error)?;
    }

    let staging = path.with_extension("toml.tmp");
    std::fs::write(&staging, content).map_err(io_error)?;
    std::fs::rename(&staging, path).map_err(io_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.toml");
        assert!(matches!(load_config(&path), Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn test_load_directory_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            load_config(dir.path()),
            Err(ConfigError::Io { .. })
        ));
    }

    #[test]
    fn test_save_leaves_no_staging_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        save_config(&path, &HostConfig::default()).unwrap();
        save_config(&path, &HostConfig::default()).unwrap();

        let names: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("config.toml")]);
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = HostConfig::default();
        config.coordinator_port = 4565;
        config.session.first_port = 5001;
        config.migration.host = Some("peer.local".to_string());
        config.migration.timeout = Duration::from_secs(5);

        save_config(&path, &config).unwrap();
        let loaded: HostConfig = load_config(&path).unwrap();

        assert_eq!(loaded.coordinator_port, 4565);
        assert_eq!(loaded.session.first_port, 5001);
        assert_eq!(loaded.migration_target(), "peer.local:4565");
        assert_eq!(loaded.migration.timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "coordinator_port = 1999\n\n[session]\nmax_workers = 4\n").unwrap();

        let loaded: HostConfig = load_config(&path).unwrap();
        assert_eq!(loaded.coordinator_port, 1999);
        assert_eq!(loaded.session.first_port, 3001);
        assert_eq!(loaded.session.max_workers, Some(4));
        assert!(loaded.ignore_favicon);
    }
}
