//! Server mode - answer pings until shutdown.

use eyre::{Result, WrapErr};
use pinger_net_host::Libp2pHost;
use pinger_net_ping::{PingMetrics, TracingObserver, serve};
use pinger_tasks::Shutdown;
use tracing::info;

use crate::config::PingerConfig;

/// Register the responder, print how to reach this node and wait for shutdown.
pub async fn run(config: &PingerConfig, shutdown: Shutdown) -> Result<()> {
    let host = Libp2pHost::spawn(&config.network).wrap_err("failed to start host")?;
    serve(&host, (TracingObserver, PingMetrics::default()))
        .wrap_err("failed to register ping handler")?;

    let info = host.addr_info().await.wrap_err("host stopped before listening")?;

    println!("Host ID: {}", host.local_peer_id());
    println!("Connect to me on:");
    for addr in info.p2p_addrs() {
        println!("  {addr}");
    }

    info!("Waiting for pings... (press Ctrl+C to stop)");
    shutdown.triggered().await;

    info!("Server shutdown complete");
    Ok(())
}
