//! Observability sink for ping loops.
//!
//! Both roles report what they do through an injected [`PingObserver`]
//! instead of logging globally, so callers decide where events go.

use std::time::Duration;

use libp2p::PeerId;
use tracing::{debug, info, warn};

/// Events emitted by the ping roles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PingEvent {
    /// The initiator is about to write probe `seq`.
    PingSent {
        /// The peer being probed.
        peer_id: PeerId,
        /// Probe sequence number, starting at 1.
        seq: u64,
    },
    /// The echo matched the payload.
    PongReceived {
        /// The peer that responded.
        peer_id: PeerId,
        /// Probe sequence number.
        seq: u64,
        /// Time from the start of the write to the end of the read.
        rtt: Duration,
    },
    /// The echo arrived in time but differs from the payload.
    Mismatch {
        /// The peer that responded.
        peer_id: PeerId,
        /// Probe sequence number.
        seq: u64,
    },
    /// The responder read a full ping.
    PingReceived {
        /// The peer that sent the ping.
        peer_id: PeerId,
    },
    /// The responder echoed a ping back.
    PongSent {
        /// The peer the pong went to.
        peer_id: PeerId,
    },
    /// A loop ended on a fatal error.
    Failed {
        /// The peer on the other end of the stream.
        peer_id: PeerId,
        /// Error description.
        error: String,
    },
}

/// Receives [`PingEvent`]s.
#[auto_impl::auto_impl(&, Arc)]
pub trait PingObserver: Send + Sync {
    fn on_event(&self, event: &PingEvent);
}

impl PingObserver for () {
    fn on_event(&self, _: &PingEvent) {}
}

impl<A: PingObserver, B: PingObserver> PingObserver for (A, B) {
    fn on_event(&self, event: &PingEvent) {
        self.0.on_event(event);
        self.1.on_event(event);
    }
}

/// Writes every event to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl PingObserver for TracingObserver {
    fn on_event(&self, event: &PingEvent) {
        match event {
            PingEvent::PingSent { peer_id, seq } => debug!(%peer_id, seq, "sending ping"),
            PingEvent::PongReceived { peer_id, seq, rtt } => {
                info!(%peer_id, seq, ?rtt, "received pong")
            }
            PingEvent::Mismatch { peer_id, seq } => {
                warn!(%peer_id, seq, "received invalid pong")
            }
            PingEvent::PingReceived { peer_id } => debug!(%peer_id, "received ping"),
            PingEvent::PongSent { peer_id } => debug!(%peer_id, "responded with pong"),
            PingEvent::Failed { peer_id, error } => warn!(%peer_id, %error, "ping failed"),
        }
    }
}

#[cfg(any(test, feature = "test-utils"))]
pub use recording::RecordingObserver;

#[cfg(any(test, feature = "test-utils"))]
mod recording {
    use std::sync::Arc;

    use parking_lot::Mutex;

    use super::{PingEvent, PingObserver};

    /// Keeps every event for later assertions.
    #[derive(Debug, Clone, Default)]
    pub struct RecordingObserver {
        events: Arc<Mutex<Vec<PingEvent>>>,
    }

    impl RecordingObserver {
        pub fn new() -> Self {
            Self::default()
        }

        /// Snapshot of all events so far.
        pub fn events(&self) -> Vec<PingEvent> {
            self.events.lock().clone()
        }

        /// Number of events matching `pred`.
        pub fn count(&self, pred: impl Fn(&PingEvent) -> bool) -> usize {
            self.events.lock().iter().filter(|e| pred(e)).count()
        }

        pub fn pongs(&self) -> usize {
            self.count(|e| matches!(e, PingEvent::PongReceived { .. }))
        }

        pub fn mismatches(&self) -> usize {
            self.count(|e| matches!(e, PingEvent::Mismatch { .. }))
        }
    }

    impl PingObserver for RecordingObserver {
        fn on_event(&self, event: &PingEvent) {
            self.events.lock().push(event.clone());
        }
    }
}
