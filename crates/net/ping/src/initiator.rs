//! Outbound side: the probe loop.

use std::{io, time::Duration};

use pinger_tasks::Shutdown;
use tokio::time::Instant;
use tracing::debug;

use crate::{
    PING_INTERVAL, PING_LENGTH, PingError, PingEvent, PingObserver, PingStream, RESPONSE_TIMEOUT,
    payload::Payload, read_message,
};

/// Timing of the probe loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PingConfig {
    /// Pause between the end of one probe and the start of the next.
    pub interval: Duration,
    /// How long to wait for the echo of a probe.
    pub timeout: Duration,
}

impl Default for PingConfig {
    fn default() -> Self {
        Self {
            interval: PING_INTERVAL,
            timeout: RESPONSE_TIMEOUT,
        }
    }
}

impl PingConfig {
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Outcome of a single probe that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Probe {
    /// The echo matched.
    Pong {
        /// Round-trip time.
        rtt: Duration,
    },
    /// The echo arrived but differs from the payload.
    Mismatch,
}

/// Sends probes over one stream and verifies their echoes.
///
/// Probes are strictly sequential: a probe is written only after the previous
/// one was answered or failed.
#[derive(Debug)]
pub struct Initiator<O> {
    config: PingConfig,
    payload: Payload,
    response: [u8; PING_LENGTH],
    seq: u64,
    observer: O,
}

impl<O: PingObserver> Initiator<O> {
    /// Create an initiator with a freshly generated random payload.
    pub fn new(config: PingConfig, observer: O) -> Self {
        Self {
            config,
            payload: Payload::random(),
            response: [0u8; PING_LENGTH],
            seq: 0,
            observer,
        }
    }

    /// Use a fixed payload instead of a random one.
    pub fn with_payload(mut self, payload: Payload) -> Self {
        self.payload = payload;
        self
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    pub fn config(&self) -> &PingConfig {
        &self.config
    }

    /// Run one probe: write, await the echo under the deadline, compare.
    ///
    /// The read deadline is cleared again before a successful probe returns.
    pub async fn probe<S>(&mut self, stream: &mut S) -> Result<Probe, PingError>
    where
        S: PingStream + ?Sized,
    {
        self.seq += 1;
        let seq = self.seq;
        let peer_id = stream.remote_peer();

        self.observer.on_event(&PingEvent::PingSent { peer_id, seq });
        let started = Instant::now();

        stream
            .write_all(self.payload.as_ref())
            .await
            .map_err(PingError::Write)?;

        stream
            .set_read_deadline(Some(Instant::now() + self.config.timeout))
            .map_err(PingError::Deadline)?;

        match read_message(&mut *stream, &mut self.response).await {
            Ok(true) => {}
            Ok(false) => {
                return Err(PingError::Read(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "stream closed before pong",
                )));
            }
            Err(e) if e.kind() == io::ErrorKind::TimedOut => {
                return Err(PingError::Timeout(self.config.timeout));
            }
            Err(e) => return Err(PingError::Read(e)),
        }
        let rtt = started.elapsed();

        stream.set_read_deadline(None).map_err(PingError::Deadline)?;

        if self.response == *self.payload.as_bytes() {
            self.observer
                .on_event(&PingEvent::PongReceived { peer_id, seq, rtt });
            Ok(Probe::Pong { rtt })
        } else {
            self.observer.on_event(&PingEvent::Mismatch { peer_id, seq });
            Ok(Probe::Mismatch)
        }
    }

    /// Probe until `shutdown` fires or a probe fails.
    ///
    /// Shutdown is checked before every probe and interrupts the sleep between
    /// probes; it never interrupts a write or read in flight. Returns `Ok(())`
    /// on shutdown. The stream is closed on every exit path.
    pub async fn run<S: PingStream>(
        mut self,
        mut stream: S,
        shutdown: &Shutdown,
    ) -> Result<(), PingError> {
        let peer_id = stream.remote_peer();

        let result = loop {
            if shutdown.is_triggered() {
                break Ok(());
            }

            if let Err(e) = self.probe(&mut stream).await {
                break Err(e);
            }

            tokio::select! {
                biased;
                _ = shutdown.triggered() => break Ok(()),
                _ = tokio::time::sleep(self.config.interval) => {}
            }
        };

        match &result {
            Ok(()) => debug!(%peer_id, probes = self.seq, "ping loop cancelled"),
            Err(e) => self.observer.on_event(&PingEvent::Failed {
                peer_id,
                error: e.to_string(),
            }),
        }

        if let Err(e) = stream.close().await {
            debug!(%peer_id, error = %e, "error closing ping stream");
        }

        result
    }
}
