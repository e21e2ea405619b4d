//! Shutdown signalling for long-running loops.
//!
//! A [`ShutdownSignal`] is held by whoever decides the process should stop
//! (usually the OS signal handler); any number of cloned [`Shutdown`] listeners
//! are passed explicitly into the loops that must stop. Dropping every
//! [`ShutdownSignal`] counts as a shutdown so listeners never wait forever on a
//! trigger that can no longer fire.

mod signal;

pub use signal::{spawn_os_signal_handler, wait_for_os_signal};

use tokio::sync::watch;

/// Create a connected shutdown trigger and listener.
pub fn channel() -> (ShutdownSignal, Shutdown) {
    let (tx, rx) = watch::channel(false);
    (ShutdownSignal { tx }, Shutdown { rx })
}

/// Trigger side of a shutdown channel.
#[derive(Debug)]
pub struct ShutdownSignal {
    tx: watch::Sender<bool>,
}

impl ShutdownSignal {
    /// Request shutdown. Idempotent.
    pub fn fire(&self) {
        self.tx.send_replace(true);
    }

    /// Create another listener for this signal.
    pub fn subscribe(&self) -> Shutdown {
        Shutdown {
            rx: self.tx.subscribe(),
        }
    }
}

/// Listener side of a shutdown channel.
#[derive(Debug, Clone)]
pub struct Shutdown {
    rx: watch::Receiver<bool>,
}

impl Shutdown {
    /// Returns true once shutdown has been requested.
    pub fn is_triggered(&self) -> bool {
        *self.rx.borrow() || self.rx.has_changed().is_err()
    }

    /// Completes once shutdown has been requested.
    pub async fn triggered(&self) {
        let mut rx = self.rx.clone();
        // Err means every trigger was dropped.
        let _ = rx.wait_for(|fired| *fired).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn not_triggered_initially() {
        let (_signal, shutdown) = channel();
        assert!(!shutdown.is_triggered());
    }

    #[test]
    fn fire_reaches_all_listeners() {
        let (signal, shutdown) = channel();
        let other = shutdown.clone();
        let late = signal.subscribe();

        signal.fire();
        signal.fire();

        assert!(shutdown.is_triggered());
        assert!(other.is_triggered());
        assert!(late.is_triggered());
    }

    #[test]
    fn dropping_trigger_counts_as_shutdown() {
        let (signal, shutdown) = channel();
        drop(signal);
        assert!(shutdown.is_triggered());
    }

    #[tokio::test(start_paused = true)]
    async fn triggered_wakes_waiter() {
        let (signal, shutdown) = channel();

        let waiter = tokio::spawn(async move {
            shutdown.triggered().await;
        });

        tokio::time::sleep(Duration::from_secs(3)).await;
        assert!(!waiter.is_finished());

        signal.fire();
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn triggered_returns_after_trigger_dropped() {
        let (signal, shutdown) = channel();
        drop(signal);
        shutdown.triggered().await;
    }
}
