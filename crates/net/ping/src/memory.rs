//! In-memory stream pairs for tests.

use std::{
    io,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use async_trait::async_trait;
use libp2p::PeerId;
use tokio::{sync::mpsc, time::Instant};

use crate::PingStream;

enum Chunk {
    Data(Vec<u8>),
    Reset,
}

/// Create two connected streams: the first one is held by `a` and talks to
/// `b`, the second one the other way round.
pub fn pair(a: PeerId, b: PeerId) -> (MemoryStream, MemoryStream) {
    let (a_tx, b_rx) = mpsc::unbounded_channel();
    let (b_tx, a_rx) = mpsc::unbounded_channel();
    (MemoryStream::new(b, a_tx, a_rx), MemoryStream::new(a, b_tx, b_rx))
}

/// Lifecycle flags of a [`MemoryStream`], observable after the stream moved.
#[derive(Debug, Clone, Default)]
pub struct StreamStatus {
    closed: Arc<AtomicBool>,
    reset: Arc<AtomicBool>,
}

impl StreamStatus {
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn is_reset(&self) -> bool {
        self.reset.load(Ordering::SeqCst)
    }

    /// Neither closed nor reset.
    pub fn is_open(&self) -> bool {
        !self.is_closed() && !self.is_reset()
    }
}

/// One end of an in-memory, ordered, reliable byte stream.
///
/// Closing ends the remote's reads with end-of-stream; resetting ends them
/// with [`io::ErrorKind::ConnectionReset`].
pub struct MemoryStream {
    remote: PeerId,
    tx: Option<mpsc::UnboundedSender<Chunk>>,
    rx: mpsc::UnboundedReceiver<Chunk>,
    pending: Vec<u8>,
    offset: usize,
    deadline: Option<Instant>,
    remote_reset: bool,
    status: StreamStatus,
}

impl MemoryStream {
    fn new(
        remote: PeerId,
        tx: mpsc::UnboundedSender<Chunk>,
        rx: mpsc::UnboundedReceiver<Chunk>,
    ) -> Self {
        Self {
            remote,
            tx: Some(tx),
            rx,
            pending: Vec::new(),
            offset: 0,
            deadline: None,
            remote_reset: false,
            status: StreamStatus::default(),
        }
    }

    /// Handle to this stream's lifecycle flags.
    pub fn status(&self) -> StreamStatus {
        self.status.clone()
    }

    fn ensure_open(&self) -> io::Result<()> {
        if self.status.is_open() {
            Ok(())
        } else {
            Err(io::Error::new(io::ErrorKind::NotConnected, "stream terminated"))
        }
    }

    fn drain_pending(&mut self, buf: &mut [u8]) -> usize {
        let available = self.pending.get(self.offset..).unwrap_or_default();
        let n = available.len().min(buf.len());
        if let (Some(dst), Some(src)) = (buf.get_mut(..n), available.get(..n)) {
            dst.copy_from_slice(src);
        }
        self.offset += n;
        if self.offset >= self.pending.len() {
            self.pending.clear();
            self.offset = 0;
        }
        n
    }
}

impl std::fmt::Debug for MemoryStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStream")
            .field("remote", &self.remote)
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl PingStream for MemoryStream {
    fn remote_peer(&self) -> PeerId {
        self.remote
    }

    async fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.ensure_open()?;
        if buf.is_empty() {
            return Ok(0);
        }
        if !self.pending.is_empty() {
            return Ok(self.drain_pending(buf));
        }
        if self.remote_reset {
            return Err(io::ErrorKind::ConnectionReset.into());
        }

        let chunk = match self.deadline {
            Some(deadline) => tokio::time::timeout_at(deadline, self.rx.recv())
                .await
                .map_err(|_| io::Error::new(io::ErrorKind::TimedOut, "read deadline exceeded"))?,
            None => self.rx.recv().await,
        };

        match chunk {
            Some(Chunk::Data(data)) => {
                self.pending = data;
                self.offset = 0;
                Ok(self.drain_pending(buf))
            }
            Some(Chunk::Reset) => {
                self.remote_reset = true;
                Err(io::ErrorKind::ConnectionReset.into())
            }
            None => Ok(0),
        }
    }

    async fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        self.ensure_open()?;
        let tx = self
            .tx
            .as_ref()
            .ok_or_else(|| io::Error::from(io::ErrorKind::BrokenPipe))?;
        tx.send(Chunk::Data(buf.to_vec()))
            .map_err(|_| io::Error::from(io::ErrorKind::BrokenPipe))
    }

    fn set_read_deadline(&mut self, deadline: Option<Instant>) -> io::Result<()> {
        self.deadline = deadline;
        Ok(())
    }

    fn read_deadline(&self) -> Option<Instant> {
        self.deadline
    }

    async fn close(&mut self) -> io::Result<()> {
        self.tx = None;
        if !self.status.is_reset() {
            self.status.closed.store(true, Ordering::SeqCst);
        }
        Ok(())
    }

    async fn reset(&mut self) {
        if let Some(tx) = self.tx.take() {
            let _ = tx.send(Chunk::Reset);
        }
        self.status.reset.store(true, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn bytes_flow_in_order() {
        let (mut a, mut b) = pair(PeerId::random(), PeerId::random());
        a.write_all(b"hello ").await.unwrap();
        a.write_all(b"world").await.unwrap();

        let mut buf = [0u8; 11];
        let mut filled = 0;
        while filled < buf.len() {
            filled += b.read(&mut buf[filled..]).await.unwrap();
        }
        assert_eq!(&buf, b"hello world");
    }

    #[tokio::test]
    async fn peers_are_crossed() {
        let (ida, idb) = (PeerId::random(), PeerId::random());
        let (a, b) = pair(ida, idb);
        assert_eq!(a.remote_peer(), idb);
        assert_eq!(b.remote_peer(), ida);
    }

    #[tokio::test]
    async fn close_is_eof_for_remote() {
        let (mut a, mut b) = pair(PeerId::random(), PeerId::random());
        a.close().await.unwrap();
        assert_eq!(b.read(&mut [0u8; 4]).await.unwrap(), 0);
        assert!(a.status().is_closed());
    }

    #[tokio::test]
    async fn reset_is_error_for_remote() {
        let (mut a, mut b) = pair(PeerId::random(), PeerId::random());
        a.reset().await;
        let err = b.read(&mut [0u8; 4]).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::ConnectionReset);
    }

    #[tokio::test(start_paused = true)]
    async fn read_honours_deadline() {
        let (_a, mut b) = pair(PeerId::random(), PeerId::random());
        b.set_read_deadline(Some(Instant::now() + Duration::from_secs(1)))
            .unwrap();
        let err = b.read(&mut [0u8; 4]).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::TimedOut);
    }
}
