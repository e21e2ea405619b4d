//! Running the protocol on top of a peer-to-peer host.
//!
//! The host owns connection establishment, security and multiplexing; the
//! protocol only needs the three operations of [`StreamHost`].

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;
use libp2p::{PeerId, StreamProtocol};
use pinger_net_addr::PeerAddrInfo;
use pinger_tasks::Shutdown;
use tracing::info;

use crate::{ClientError, Initiator, PROTOCOL, PingConfig, PingObserver, PingStream, Responder};

/// Called once per inbound stream; the handler owns the stream.
pub type StreamHandler<S> = Arc<dyn Fn(S) -> BoxFuture<'static, ()> + Send + Sync>;

/// The networking layer the protocol runs on.
#[async_trait]
pub trait StreamHost: Send + Sync {
    type Stream: PingStream + 'static;
    type Error: std::error::Error + Send + Sync + 'static;

    /// Establish a connection to `target`.
    async fn connect(&self, target: &PeerAddrInfo) -> Result<(), Self::Error>;

    /// Open a new outbound stream to a connected peer.
    async fn open_stream(
        &self,
        peer: PeerId,
        protocol: StreamProtocol,
    ) -> Result<Self::Stream, Self::Error>;

    /// Route every inbound stream for `protocol` to `handler`.
    fn register_handler(
        &self,
        protocol: StreamProtocol,
        handler: StreamHandler<Self::Stream>,
    ) -> Result<(), Self::Error>;
}

/// Answer pings on every inbound [`PROTOCOL`] stream.
///
/// Each stream is handled independently; failures are reported to the
/// observer and never affect other streams.
pub fn serve<H, O>(host: &H, observer: O) -> Result<(), H::Error>
where
    H: StreamHost,
    O: PingObserver + 'static,
{
    let responder = Arc::new(Responder::new(observer));
    let handler: StreamHandler<H::Stream> =
        Arc::new(move |stream: H::Stream| -> BoxFuture<'static, ()> {
            let responder = responder.clone();
            Box::pin(async move {
                // Failures already went to the observer.
                let _ = responder.handle(stream).await;
            })
        });
    host.register_handler(PROTOCOL, handler)
}

/// Connect to `target`, open one ping stream and probe until `shutdown` fires.
///
/// Shutdown while connecting is not an error either.
pub async fn run_client<H, O>(
    host: &H,
    target: &PeerAddrInfo,
    config: PingConfig,
    observer: O,
    shutdown: &Shutdown,
) -> Result<(), ClientError<H::Error>>
where
    H: StreamHost,
    O: PingObserver,
{
    let peer_id = *target.peer_id();

    let stream = tokio::select! {
        biased;
        _ = shutdown.triggered() => return Ok(()),
        stream = open(host, target) => stream?,
    };

    info!(%peer_id, "Starting ping");
    Initiator::new(config, observer)
        .run(stream, shutdown)
        .await?;
    Ok(())
}

async fn open<H: StreamHost>(
    host: &H,
    target: &PeerAddrInfo,
) -> Result<H::Stream, ClientError<H::Error>> {
    host.connect(target).await.map_err(ClientError::Connect)?;
    host.open_stream(*target.peer_id(), PROTOCOL)
        .await
        .map_err(ClientError::OpenStream)
}
