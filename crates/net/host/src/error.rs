use libp2p::{Multiaddr, PeerId, StreamProtocol, TransportError, identity::DecodingError};
use libp2p_stream::OpenStreamError;

/// Errors from the libp2p host.
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error("invalid identity key: {0}")]
    Identity(#[from] DecodingError),
    #[error("failed to build transport: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),
    #[error("failed to listen on {addr}")]
    Listen {
        addr: Multiaddr,
        #[source]
        source: TransportError<std::io::Error>,
    },
    #[error("failed to dial {peer_id}: {reason}")]
    Dial { peer_id: PeerId, reason: String },
    #[error("failed to open stream to {peer_id}")]
    OpenStream {
        peer_id: PeerId,
        #[source]
        source: OpenStreamError,
    },
    #[error("handler for {0} already registered")]
    AlreadyRegistered(StreamProtocol),
    #[error("host is shut down")]
    Shutdown,
}

impl HostError {
    pub(crate) fn transport(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Transport(Box::new(err))
    }
}
