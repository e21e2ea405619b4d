//! Command line interface.

use std::{
    net::{IpAddr, SocketAddr},
    path::PathBuf,
};

use clap::Parser;
use pinger_net_host::Transport;
use pinger_observability::LogArgs;

/// Ping libp2p peers over `/ipfs/ping/1.0.0`.
///
/// Without `--dest` the node answers pings and prints the addresses it can be
/// reached on. With `--dest` it pings that peer every interval until stopped.
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Port to listen on (0 picks a free port).
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Address to listen on.
    #[arg(long, value_name = "IP")]
    pub addr: Option<IpAddr>,

    /// Peer to ping, e.g. `/ip4/127.0.0.1/udp/4001/quic-v1/p2p/12D3Koo...`.
    #[arg(short, long, value_name = "MULTIADDR")]
    pub dest: Option<String>,

    /// Seed for a deterministic peer ID (0 picks a random one).
    #[arg(short, long)]
    pub seed: Option<u64>,

    /// Transport to listen on.
    #[arg(long, value_enum)]
    pub transport: Option<Transport>,

    /// Pause between probes in milliseconds.
    #[arg(long = "interval-ms", value_name = "MS")]
    pub interval_ms: Option<u64>,

    /// How long to wait for an echo in milliseconds.
    #[arg(long = "timeout-ms", value_name = "MS")]
    pub timeout_ms: Option<u64>,

    /// Serve Prometheus metrics on this address.
    #[arg(long = "metrics.addr", value_name = "SOCKET")]
    pub metrics_addr: Option<SocketAddr>,

    /// Path to a TOML configuration file.
    #[arg(long, value_name = "PATH", env = "PINGER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Logging configuration.
    #[command(flatten)]
    pub logs: LogArgs,
}
