//! Command line entry point for pinger.
//!
//! Configuration is loaded using Figment with the following priority
//! (highest wins):
//!
//! 1. CLI arguments
//! 2. Config file (TOML)
//! 3. Environment variables (`PINGER_` prefix)
//! 4. Defaults

mod cli;
pub mod commands;
pub mod config;

pub use cli::Cli;
pub use config::{MetricsSettings, PingSettings, PingerConfig};

use clap::Parser;
use color_eyre::eyre;
use pinger_observability::{init_logging, install_prometheus};
use pinger_tasks::spawn_os_signal_handler;
use tracing::{debug, info};

/// Run pinger with the process arguments.
///
/// This is the main entry point that should be called from the binary.
pub async fn run() -> eyre::Result<()> {
    // Setup error handling
    color_eyre::install()?;

    let cli = Cli::parse();

    let mut config = PingerConfig::load(cli.config.as_deref())?;
    config.apply_cli(&cli);
    init_logging(&config.logs)?;
    config.validate()?;
    debug!(?config, "Loaded configuration");

    info!("Starting pinger {}", env!("CARGO_PKG_VERSION"));

    if let Some(addr) = config.metrics.addr {
        install_prometheus(addr)?;
    }

    let (signal, shutdown) = pinger_tasks::channel();
    let _signal_handler = spawn_os_signal_handler(signal);

    match cli.dest.as_deref() {
        Some(dest) => commands::client::run(&config, dest, shutdown).await,
        None => commands::server::run(&config, shutdown).await,
    }
}
