//! CLI command implementations

mod config;
mod send;
mod serve;

pub use config::{config_init, config_path, config_show, load_host_config};
pub use send::{exchange, normalize_address, send_command};
pub use serve::{parse_destination, serve_command, ServeArgs};
