//! libp2p host for the ping protocol.
//!
//! [`Libp2pHost`] owns a swarm with QUIC and TCP transports and a raw stream
//! behaviour. It implements [`StreamHost`](pinger_net_ping::StreamHost), so the
//! protocol drivers in `pinger-net-ping` run on it unchanged.

mod config;
mod error;
mod host;
mod identity;

pub use config::{DEFAULT_IDLE_TIMEOUT_SECS, DEFAULT_LISTEN_ADDR, DEFAULT_PORT, HostConfig, Transport};
pub use error::HostError;
pub use host::{HostStream, Libp2pHost};
pub use identity::keypair_from_seed;
