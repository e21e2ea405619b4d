//! Logging and metrics exporter setup.
//!
//! Library crates only emit through the `tracing` and `metrics` facades; the
//! binary decides here where the output goes.

mod logging;
mod prometheus;

pub use logging::{LogArgs, build_filter, init_logging};
pub use prometheus::install_prometheus;
