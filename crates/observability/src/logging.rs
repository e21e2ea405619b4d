//! Logging setup.

use clap::Args;
use eyre::{Result, eyre};
use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

/// Logging configuration.
#[derive(Debug, Default, Args, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[command(next_help_heading = "Logging")]
#[serde(default)]
pub struct LogArgs {
    /// Only log errors.
    #[arg(short, long)]
    pub quiet: bool,

    /// Verbose mode (-v for debug, -vv for trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    #[serde(skip)]
    pub verbosity: u8,

    /// Log filter directive (e.g., "pinger_net_ping=debug,libp2p=info").
    #[arg(long = "log.filter", value_name = "DIRECTIVE")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,

    /// Use JSON format for log output.
    #[arg(long = "log.json")]
    pub json: bool,
}

/// Build the log filter.
///
/// Precedence:
/// 1. `--quiet` shows errors only
/// 2. `RUST_LOG` if set, otherwise a level derived from `-v`
/// 3. Directives from `--log.filter` are added on top
pub fn build_filter(args: &LogArgs) -> EnvFilter {
    if args.quiet {
        return EnvFilter::new("error");
    }

    let base_level = match args.verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    let mut filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(base_level));

    if let Some(custom_filter) = &args.filter {
        for directive in custom_filter.split(',') {
            if let Ok(d) = directive.parse() {
                filter = filter.add_directive(d);
            }
        }
    }

    filter
}

/// Install the global subscriber. Fails if one is already installed.
pub fn init_logging(args: &LogArgs) -> Result<()> {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(build_filter(args))
        .with_writer(std::io::stderr);

    let result = if args.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    result.map_err(|e| eyre!("failed to initialise logging: {e}"))
}
