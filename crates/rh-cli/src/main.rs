//! roamhost CLI
//!
//! Single binary for:
//! - Running a coordinator (`serve`, alias `start`)
//! - Talking to coordinators and sessions by hand (`send`)
//! - Managing the configuration file (`config`)

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use roamhost::commands::{self, ServeArgs};
use roamhost::output::print_error;

#[derive(Parser)]
#[command(name = "roamhost")]
#[command(author, version, about = "Live agent session migration between coordinating hosts")]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a coordinator in the foreground (hands out session ports)
    #[command(alias = "start")]
    Serve(ServeArgs),

    /// Send one request line to a coordinator or session
    Send {
        /// HOST:PORT, or a bare port on 127.0.0.1
        address: String,
        /// Request text, e.g. "person=hello" or "migrate"
        #[arg(required = true)]
        text: Vec<String>,
        /// Seconds to wait for the full response
        #[arg(long, default_value_t = 10)]
        wait: u64,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show the effective configuration
    Show {
        /// Print as JSON instead of TOML
        #[arg(long)]
        json: bool,
    },
    /// Show config file path
    Path,
    /// Write a default config file
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // A running coordinator reports its lifecycle by default
    let quiet_level = match cli.command {
        Commands::Serve(_) => "info",
        _ => "warn",
    };
    let log_level = match (cli.quiet, cli.verbose) {
        (true, _) => "error",
        (false, 0) => quiet_level,
        (false, 1) => "info",
        (false, 2) => "debug",
        (false, _) => "trace",
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| log_level.into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            print_error(&format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Serve(args) => {
            commands::serve_command(cli.config.as_ref(), &args).await?;
        }

        Commands::Send {
            address,
            text,
            wait,
        } => {
            commands::send_command(&address, &text, Duration::from_secs(wait)).await?;
        }

        Commands::Config { action } => match action {
            ConfigAction::Show { json } => {
                commands::config_show(cli.config.as_ref(), json)?;
            }
            ConfigAction::Path => {
                commands::config_path(cli.config.as_ref());
            }
            ConfigAction::Init { force } => {
                commands::config_init(cli.config.as_ref(), force)?;
            }
        },
    }

    Ok(())
}
