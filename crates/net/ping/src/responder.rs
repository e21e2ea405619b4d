//! Inbound side: echo every ping back.

use tracing::debug;

use crate::{PING_LENGTH, PingError, PingEvent, PingObserver, PingStream, read_message};

/// Handles inbound ping streams.
///
/// One [`Responder`] can serve any number of streams concurrently; each call
/// to [`handle`](Self::handle) owns its stream and shares nothing with other
/// calls besides the observer.
#[derive(Debug, Clone)]
pub struct Responder<O> {
    observer: O,
}

impl<O: PingObserver> Responder<O> {
    pub fn new(observer: O) -> Self {
        Self { observer }
    }

    /// Echo pings until the remote closes the stream or an error occurs.
    ///
    /// End-of-stream at a message boundary closes the stream gracefully and
    /// returns `Ok`. Any other read or write failure, including a stream that
    /// ends mid-message, resets the stream without echoing.
    pub async fn handle<S: PingStream>(&self, mut stream: S) -> Result<(), PingError> {
        let peer_id = stream.remote_peer();
        let mut buf = [0u8; PING_LENGTH];

        loop {
            match read_message(&mut stream, &mut buf).await {
                Ok(true) => {}
                Ok(false) => {
                    debug!(%peer_id, "ping stream closed by remote");
                    if let Err(e) = stream.close().await {
                        debug!(%peer_id, error = %e, "error closing ping stream");
                    }
                    return Ok(());
                }
                Err(e) => return Err(self.abort(&mut stream, PingError::Read(e)).await),
            }

            self.observer.on_event(&PingEvent::PingReceived { peer_id });

            if let Err(e) = stream.write_all(&buf).await {
                return Err(self.abort(&mut stream, PingError::Write(e)).await);
            }

            self.observer.on_event(&PingEvent::PongSent { peer_id });
        }
    }

    async fn abort<S: PingStream>(&self, stream: &mut S, error: PingError) -> PingError {
        stream.reset().await;
        self.observer.on_event(&PingEvent::Failed {
            peer_id: stream.remote_peer(),
            error: error.to_string(),
        });
        error
    }
}
