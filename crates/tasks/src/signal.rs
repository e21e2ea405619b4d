//! OS signal handling.

use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::ShutdownSignal;

/// Completes on Ctrl+C (SIGINT) or, on unix, SIGTERM.
pub async fn wait_for_os_signal() -> std::io::Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut sigterm = signal(SignalKind::terminate())?;
        tokio::select! {
            result = tokio::signal::ctrl_c() => result,
            _ = sigterm.recv() => Ok(()),
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await
    }
}

/// Fire `signal` when the process receives an interrupt or terminate signal.
pub fn spawn_os_signal_handler(signal: ShutdownSignal) -> JoinHandle<()> {
    tokio::spawn(async move {
        match wait_for_os_signal().await {
            Ok(()) => info!("Received interrupt signal, shutting down..."),
            Err(e) => warn!(error = %e, "Failed to listen for OS signals, shutting down"),
        }
        signal.fire();
    })
}
