//! Prometheus exporter.

use std::net::SocketAddr;

use eyre::{Result, WrapErr};
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing::info;

/// Install the global Prometheus recorder and serve `/metrics` on `addr`.
///
/// Must be called from within a tokio runtime.
pub fn install_prometheus(addr: SocketAddr) -> Result<()> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .wrap_err_with(|| format!("failed to start metrics exporter on {addr}"))?;

    metrics::describe_counter!("ping.sent_total", "Pings written by the initiator");
    metrics::describe_counter!("ping.pong_total", "Matching echoes received");
    metrics::describe_counter!("ping.mismatch_total", "Echoes that differed from the payload");
    metrics::describe_counter!("ping.received_total", "Pings read by the responder");
    metrics::describe_counter!("ping.failed_total", "Ping streams ended by an error");
    metrics::describe_histogram!(
        "ping.rtt_seconds",
        metrics::Unit::Seconds,
        "Round-trip time of successful probes"
    );

    info!(%addr, "Serving metrics");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn exporter_installs_once() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        install_prometheus(addr).unwrap();
        assert!(install_prometheus(addr).is_err());
    }
}
