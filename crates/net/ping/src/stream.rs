//! The byte-stream contract the protocol runs over.

use std::io;

use async_trait::async_trait;
use futures::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use libp2p::PeerId;
use tokio::time::Instant;

/// An ordered, reliable, bidirectional byte stream to one remote peer.
///
/// Exactly one task owns a stream at a time. A read that is still pending when
/// the read deadline passes fails with [`io::ErrorKind::TimedOut`].
#[async_trait]
pub trait PingStream: Send {
    /// Identity of the peer on the other end.
    fn remote_peer(&self) -> PeerId;

    /// Read up to `buf.len()` bytes. `Ok(0)` means the remote closed its side.
    async fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Write all of `buf` and flush it.
    async fn write_all(&mut self, buf: &[u8]) -> io::Result<()>;

    /// Set or clear (`None`) the read deadline.
    fn set_read_deadline(&mut self, deadline: Option<Instant>) -> io::Result<()>;

    /// Currently armed read deadline.
    fn read_deadline(&self) -> Option<Instant>;

    /// Close the stream gracefully; the remote observes end-of-stream.
    async fn close(&mut self) -> io::Result<()>;

    /// Abort the stream, signalling abnormal termination to the remote.
    async fn reset(&mut self);
}

/// Read exactly one `buf.len()` message.
///
/// Returns `Ok(false)` if the stream ended before the first byte. A stream that
/// ends part-way through a message yields [`io::ErrorKind::UnexpectedEof`].
pub async fn read_message<S>(stream: &mut S, buf: &mut [u8]) -> io::Result<bool>
where
    S: PingStream + ?Sized,
{
    let len = buf.len();
    let mut filled = 0;
    while let Some(rest) = buf.get_mut(filled..).filter(|rest| !rest.is_empty()) {
        let n = stream.read(rest).await?;
        if n == 0 {
            if filled == 0 {
                return Ok(false);
            }
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("stream ended after {filled} of {len} bytes"),
            ));
        }
        filled += n;
    }
    Ok(true)
}

/// [`PingStream`] over any `futures` byte stream, such as a libp2p substream.
pub struct DeadlineStream<S> {
    peer: PeerId,
    /// `None` once closed or reset.
    inner: Option<S>,
    deadline: Option<Instant>,
}

impl<S> DeadlineStream<S> {
    pub fn new(peer: PeerId, inner: S) -> Self {
        Self {
            peer,
            inner: Some(inner),
            deadline: None,
        }
    }

    /// Returns true once the stream was closed or reset.
    pub fn is_terminated(&self) -> bool {
        self.inner.is_none()
    }

    fn inner_mut(&mut self) -> io::Result<&mut S> {
        self.inner
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotConnected, "stream terminated"))
    }
}

impl<S> std::fmt::Debug for DeadlineStream<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeadlineStream")
            .field("peer", &self.peer)
            .field("terminated", &self.inner.is_none())
            .field("deadline", &self.deadline)
            .finish()
    }
}

#[async_trait]
impl<S> PingStream for DeadlineStream<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    fn remote_peer(&self) -> PeerId {
        self.peer
    }

    async fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let deadline = self.deadline;
        let inner = self.inner_mut()?;
        match deadline {
            Some(deadline) => tokio::time::timeout_at(deadline, inner.read(buf))
                .await
                .map_err(|_| io::Error::new(io::ErrorKind::TimedOut, "read deadline exceeded"))?,
            None => inner.read(buf).await,
        }
    }

    async fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        let inner = self.inner_mut()?;
        inner.write_all(buf).await?;
        inner.flush().await
    }

    fn set_read_deadline(&mut self, deadline: Option<Instant>) -> io::Result<()> {
        self.deadline = deadline;
        Ok(())
    }

    fn read_deadline(&self) -> Option<Instant> {
        self.deadline
    }

    async fn close(&mut self) -> io::Result<()> {
        match self.inner.take() {
            Some(mut inner) => inner.close().await,
            None => Ok(()),
        }
    }

    async fn reset(&mut self) {
        // Dropping a substream without closing it aborts it.
        drop(self.inner.take());
    }
}
