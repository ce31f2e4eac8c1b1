//! Config command implementations

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::output::{print_success, print_warning};
use rh_core::config::{self, HostConfig};

fn resolve_path(config_path: Option<&PathBuf>) -> PathBuf {
    config_path
        .cloned()
        .unwrap_or_else(config::default_config_path)
}

/// Load the host configuration, falling back to defaults when no file exists.
///
/// An explicitly given path must exist and parse; a broken default file is
/// reported and ignored.
pub fn load_host_config(config_path: Option<&PathBuf>) -> Result<HostConfig> {
    if let Some(path) = config_path {
        return config::load_config(path)
            .with_context(|| format!("Failed to load config from {:?}", path));
    }

    let default_path = config::default_config_path();
    if default_path.exists() {
        Ok(config::load_config(&default_path).unwrap_or_else(|e| {
            tracing::warn!("Failed to load config from {:?}: {}", default_path, e);
            HostConfig::default()
        }))
    } else {
        tracing::info!("Using default configuration");
        Ok(HostConfig::default())
    }
}

/// Print the effective configuration
pub fn config_show(config_path: Option<&PathBuf>, json: bool) -> Result<()> {
    let config = load_host_config(config_path)?;
    let rendered = if json {
        serde_json::to_string_pretty(&config)?
    } else {
        toml::to_string_pretty(&config)?
    };
    println!("{}", rendered);
    Ok(())
}

/// Print the configuration file path
pub fn config_path(config_path: Option<&PathBuf>) {
    println!("{}", resolve_path(config_path).display());
}

/// Write a default configuration file
pub fn config_init(config_path: Option<&PathBuf>, force: bool) -> Result<()> {
    let path = resolve_path(config_path);

    if path.exists() && !force {
        print_warning(&format!(
            "Config file already exists at {:?} (use --force to overwrite)",
            path
        ));
        return Ok(());
    }

    write_default(&path)?;
    print_success(&format!("Wrote default configuration to {:?}", path));
    Ok(())
}

fn write_default(path: &Path) -> Result<()> {
    config::save_config(path, &HostConfig::default())
        .with_context(|| format!("Failed to write config to {:?}", path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        config_init(Some(&path), false).unwrap();
        let config = load_host_config(Some(&path)).unwrap();
        assert_eq!(config.coordinator_port, 1565);
    }

    #[test]
    fn test_init_does_not_overwrite_without_force() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "coordinator_port = 2000\n").unwrap();

        config_init(Some(&path), false).unwrap();
        assert_eq!(load_host_config(Some(&path)).unwrap().coordinator_port, 2000);

        config_init(Some(&path), true).unwrap();
        assert_eq!(load_host_config(Some(&path)).unwrap().coordinator_port, 1565);
    }

    #[test]
    fn test_explicit_missing_path_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        assert!(load_host_config(Some(&path)).is_err());
    }
}
