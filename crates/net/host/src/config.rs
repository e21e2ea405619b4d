//! Host configuration.

use std::{
    net::{IpAddr, Ipv4Addr},
    time::Duration,
};

use libp2p::{Multiaddr, multiaddr::Protocol};
use serde::{Deserialize, Serialize};

/// Default listen port; 0 lets the OS pick one.
pub const DEFAULT_PORT: u16 = 0;

/// Default listen address.
pub const DEFAULT_LISTEN_ADDR: IpAddr = IpAddr::V4(Ipv4Addr::UNSPECIFIED);

/// Connections are never closed for being idle unless configured otherwise.
pub const DEFAULT_IDLE_TIMEOUT_SECS: u64 = u64::MAX;

/// Transport the host listens on.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    /// QUIC v1 over UDP.
    #[default]
    Quic,
    /// TCP secured with noise and multiplexed with yamux.
    Tcp,
}

/// P2P host configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// Listen port.
    pub port: u16,

    /// Listen address.
    pub addr: IpAddr,

    /// Transport to listen on. Both transports can always be dialed.
    pub transport: Transport,

    /// Seed for a deterministic identity key. 0 means no seed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,

    /// Connection idle timeout in seconds.
    pub idle_timeout_secs: u64,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            addr: DEFAULT_LISTEN_ADDR,
            transport: Transport::default(),
            seed: None,
            idle_timeout_secs: DEFAULT_IDLE_TIMEOUT_SECS,
        }
    }
}

impl HostConfig {
    /// The address to listen on for the configured transport.
    pub fn listen_multiaddr(&self) -> Multiaddr {
        let base = Multiaddr::empty().with(Protocol::from(self.addr));
        match self.transport {
            Transport::Quic => base.with(Protocol::Udp(self.port)).with(Protocol::QuicV1),
            Transport::Tcp => base.with(Protocol::Tcp(self.port)),
        }
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }
}
