//! Error types for peer address resolution.

/// Errors from [`parse_peer_addr`](crate::parse_peer_addr).
#[derive(Debug, thiserror::Error)]
pub enum AddrError {
    #[error("failed to parse multiaddr: {0}")]
    Parse(#[from] libp2p::multiaddr::Error),
    #[error("multiaddr {0} does not end with a /p2p/<peer-id> component")]
    MissingPeerId(libp2p::Multiaddr),
    #[error("multiaddr {0} carries no transport address before /p2p")]
    NoAddress(libp2p::Multiaddr),
}
