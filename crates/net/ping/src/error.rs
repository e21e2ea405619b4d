//! Error types for the ping protocol.

use std::{io, time::Duration};

/// Fatal failure of a ping loop.
///
/// An echo that does not match the payload is not an error; it is reported as
/// [`PingEvent::Mismatch`](crate::PingEvent::Mismatch) and the loop continues.
#[derive(Debug, thiserror::Error)]
pub enum PingError {
    #[error("failed to write ping: {0}")]
    Write(#[source] io::Error),
    #[error("failed to read pong: {0}")]
    Read(#[source] io::Error),
    #[error("no pong within {0:?}")]
    Timeout(Duration),
    #[error("failed to set read deadline: {0}")]
    Deadline(#[source] io::Error),
}

impl PingError {
    /// Returns true if the peer did not answer in time.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }
}

/// Errors from [`run_client`](crate::run_client).
#[derive(Debug, thiserror::Error)]
pub enum ClientError<E: std::error::Error + 'static> {
    #[error("failed to connect to peer: {0}")]
    Connect(#[source] E),
    #[error("failed to open stream: {0}")]
    OpenStream(#[source] E),
    #[error(transparent)]
    Ping(#[from] PingError),
}
