//! Ping metrics.

use ::metrics::{Counter, Histogram};

use crate::{PingEvent, PingObserver};

/// Counters and the RTT histogram for ping traffic.
#[derive(Clone, Debug)]
pub struct PingMetrics {
    /// Number of probes written
    pub(crate) sent_total: Counter,
    /// Number of matching echoes
    pub(crate) pong_total: Counter,
    /// Number of echoes that did not match the payload
    pub(crate) mismatch_total: Counter,
    /// Number of pings answered by the responder
    pub(crate) received_total: Counter,
    /// Number of loops that ended on a fatal error
    pub(crate) failed_total: Counter,
    /// Round-trip time of matching echoes
    pub(crate) rtt_seconds: Histogram,
}

impl Default for PingMetrics {
    fn default() -> Self {
        Self {
            sent_total: ::metrics::counter!("ping.sent_total"),
            pong_total: ::metrics::counter!("ping.pong_total"),
            mismatch_total: ::metrics::counter!("ping.mismatch_total"),
            received_total: ::metrics::counter!("ping.received_total"),
            failed_total: ::metrics::counter!("ping.failed_total"),
            rtt_seconds: ::metrics::histogram!("ping.rtt_seconds"),
        }
    }
}

impl PingObserver for PingMetrics {
    fn on_event(&self, event: &PingEvent) {
        match event {
            PingEvent::PingSent { .. } => self.sent_total.increment(1),
            PingEvent::PongReceived { rtt, .. } => {
                self.pong_total.increment(1);
                self.rtt_seconds.record(rtt.as_secs_f64());
            }
            PingEvent::Mismatch { .. } => self.mismatch_total.increment(1),
            PingEvent::PingReceived { .. } => self.received_total.increment(1),
            PingEvent::PongSent { .. } => {}
            PingEvent::Failed { .. } => self.failed_total.increment(1),
        }
    }
}
