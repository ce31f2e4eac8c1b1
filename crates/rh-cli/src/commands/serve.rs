//! Run a coordinator in the foreground

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Result};
use clap::Args;
use tokio_util::sync::CancellationToken;

use crate::commands::load_host_config;
use crate::output::print_success;
use rh_core::HostConfig;
use rh_host::{Coordinator, HostState};

/// Coordinator overrides; each flag wins over the config file
#[derive(Debug, Default, Args)]
pub struct ServeArgs {
    /// Coordinator port
    #[arg(short, long)]
    pub port: Option<u16>,

    /// First port handed out to sessions
    #[arg(long, value_name = "PORT")]
    pub first_session_port: Option<u16>,

    /// Interface to bind the coordinator and sessions to
    #[arg(long, value_name = "ADDR")]
    pub host: Option<String>,

    /// Host name written into pages for clients to reconnect to
    #[arg(long, value_name = "HOST")]
    pub advertise: Option<String>,

    /// Coordinator that sessions migrate to
    #[arg(long, value_name = "HOST[:PORT]")]
    pub migrate_to: Option<String>,

    /// Seconds to wait for the destination coordinator's reply
    #[arg(long, value_name = "SECS")]
    pub migration_timeout: Option<u64>,

    /// Maximum concurrent request workers per session
    #[arg(long, value_name = "N")]
    pub max_workers: Option<usize>,
}

impl ServeArgs {
    /// Apply the overrides on top of a loaded configuration
    pub fn apply(&self, config: &mut HostConfig) -> Result<()> {
        if let Some(port) = self.port {
            config.coordinator_port = port;
        }
        if let Some(port) = self.first_session_port {
            config.session.first_port = port;
        }
        if let Some(host) = &self.host {
            config.bind_host = host.clone();
        }
        if let Some(host) = &self.advertise {
            config.advertised_host = host.clone();
        }
        if let Some(destination) = &self.migrate_to {
            let (host, port) = parse_destination(destination)?;
            config.migration.host = Some(host);
            config.migration.port = port;
        }
        if let Some(secs) = self.migration_timeout {
            config.migration.timeout = Duration::from_secs(secs);
        }
        if let Some(limit) = self.max_workers {
            config.session.max_workers = Some(limit);
        }
        Ok(())
    }
}

/// Split `host[:port]`
pub fn parse_destination(destination: &str) -> Result<(String, Option<u16>)> {
    match destination.rsplit_once(':') {
        Some((host, port)) => {
            if host.is_empty() {
                bail!("Missing host in migration destination {:?}", destination);
            }
            let port = port
                .parse::<u16>()
                .map_err(|_| anyhow::anyhow!("Invalid port in migration destination {:?}", destination))?;
            Ok((host.to_string(), Some(port)))
        }
        None if destination.is_empty() => bail!("Empty migration destination"),
        None => Ok((destination.to_string(), None)),
    }
}

pub async fn serve_command(config_path: Option<&PathBuf>, args: &ServeArgs) -> Result<()> {
    let mut config = load_host_config(config_path)?;
    args.apply(&mut config)?;
    config.validate()?;

    tracing::info!(
        "Sessions start at port {}, migrations go to {}",
        config.session.first_port,
        config.migration_target()
    );

    let state = Arc::new(HostState::new(config));
    let cancel = CancellationToken::new();
    spawn_signal_handler(cancel.clone());

    let coordinator = Coordinator::bind(state, cancel).await?;
    print_success(&format!(
        "Coordinator listening on {}",
        coordinator.local_addr()?
    ));

    coordinator.run().await?;
    tracing::info!("Coordinator shutdown complete");
    Ok(())
}

fn spawn_signal_handler(cancel: CancellationToken) {
    tokio::spawn(async move {
        let ctrl_c = tokio::signal::ctrl_c();

        #[cfg(unix)]
        let terminate = async {
            use tokio::signal::unix::{signal, SignalKind};
            match signal(SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    sigterm.recv().await;
                }
                Err(e) => {
                    tracing::warn!("Failed to install SIGTERM handler: {}", e);
                    std::future::pending::<()>().await;
                }
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => {
                tracing::info!("Received Ctrl+C, initiating shutdown...");
            }
            _ = terminate => {
                tracing::info!("Received SIGTERM, initiating shutdown...");
            }
        }

        cancel.cancel();
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_destination() {
        assert_eq!(
            parse_destination("peer.local:2565").unwrap(),
            ("peer.local".to_string(), Some(2565))
        );
        assert_eq!(
            parse_destination("peer.local").unwrap(),
            ("peer.local".to_string(), None)
        );
        assert!(parse_destination(":2565").is_err());
        assert!(parse_destination("peer:notaport").is_err());
        assert!(parse_destination("").is_err());
    }

    #[test]
    fn test_overrides_apply() {
        let args = ServeArgs {
            port: Some(1600),
            first_session_port: Some(5001),
            migrate_to: Some("10.1.1.1".to_string()),
            migration_timeout: Some(3),
            ..Default::default()
        };

        let mut config = HostConfig::default();
        args.apply(&mut config).unwrap();

        assert_eq!(config.coordinator_port, 1600);
        assert_eq!(config.session.first_port, 5001);
        assert_eq!(config.migration_target(), "10.1.1.1:1600");
        assert_eq!(config.migration.timeout, Duration::from_secs(3));
        assert_eq!(config.bind_host, "0.0.0.0");
    }
}
