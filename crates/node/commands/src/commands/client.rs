//! Client mode - ping one peer until shutdown or failure.

use eyre::{Result, WrapErr};
use pinger_net_addr::{PeerAddrInfo, parse_peer_addr};
use pinger_net_host::Libp2pHost;
use pinger_net_ping::{PingMetrics, TracingObserver, run_client};
use pinger_tasks::Shutdown;
use tracing::info;

use crate::config::PingerConfig;

/// Resolve a destination string before anything touches the network.
pub fn resolve_target(dest: &str) -> Result<PeerAddrInfo> {
    parse_peer_addr(dest).wrap_err_with(|| format!("invalid destination address `{dest}`"))
}

/// Ping `dest` until `shutdown` fires. Cancellation is a clean exit; a broken
/// stream or an unreachable peer is an error.
pub async fn run(config: &PingerConfig, dest: &str, shutdown: Shutdown) -> Result<()> {
    let target = resolve_target(dest)?;

    let host = Libp2pHost::spawn(&config.network).wrap_err("failed to start host")?;
    info!(
        local_peer_id = %host.local_peer_id(),
        remote_peer_id = %target.peer_id(),
        "Pinging peer"
    );

    run_client(
        &host,
        &target,
        config.ping_config(),
        (TracingObserver, PingMetrics::default()),
        &shutdown,
    )
    .await
    .wrap_err_with(|| format!("pinging {} failed", target.peer_id()))?;

    info!("Client shutdown complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_destination() {
        let target = resolve_target(
            "/ip4/127.0.0.1/udp/4001/quic-v1/p2p/12D3KooWDpJ7As7BWAwRMfu1VU2WCqNjvq387JEYKDBj4kx6nXTN",
        )
        .unwrap();
        assert_eq!(target.addrs().len(), 1);
    }

    #[test]
    fn destination_without_peer_id_is_rejected() {
        let err = resolve_target("/ip4/127.0.0.1/udp/4001/quic-v1").unwrap_err();
        assert!(err.to_string().contains("invalid destination address"));
    }

    #[tokio::test]
    async fn bad_destination_fails_before_host_starts() {
        let (_signal, shutdown) = pinger_tasks::channel();
        let config = PingerConfig::default();
        assert!(run(&config, "not-a-multiaddr", shutdown).await.is_err());
    }
}
