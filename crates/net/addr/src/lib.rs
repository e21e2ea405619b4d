//! Peer address resolution for `/p2p/` multiaddrs.
//!
//! Turns a self-describing multiaddr such as
//! `/ip4/127.0.0.1/udp/4001/quic-v1/p2p/12D3KooW...` into a [`PeerAddrInfo`]:
//! the peer identity plus the transport addresses it can be dialed at.
//!
//! Resolution is pure: no DNS lookups, no I/O.

mod error;

pub use error::AddrError;

use std::{fmt, str::FromStr};

use libp2p::{Multiaddr, PeerId, multiaddr::Protocol};

/// A peer identity together with the addresses it is reachable at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerAddrInfo {
    peer_id: PeerId,
    addrs: Vec<Multiaddr>,
}

impl PeerAddrInfo {
    /// Create from parts. Addresses are stored without a `/p2p` suffix.
    pub fn new(peer_id: PeerId, addrs: Vec<Multiaddr>) -> Self {
        let addrs = addrs.into_iter().map(strip_p2p).collect();
        Self { peer_id, addrs }
    }

    pub fn peer_id(&self) -> &PeerId {
        &self.peer_id
    }

    pub fn addrs(&self) -> &[Multiaddr] {
        &self.addrs
    }

    /// Consume into `(peer_id, addrs)`.
    pub fn into_parts(self) -> (PeerId, Vec<Multiaddr>) {
        (self.peer_id, self.addrs)
    }

    /// Full `/p2p/`-qualified addresses, suitable for handing to another
    /// process as a connection string.
    pub fn p2p_addrs(&self) -> Vec<Multiaddr> {
        self.addrs
            .iter()
            .map(|addr| with_p2p(addr.clone(), self.peer_id))
            .collect()
    }
}

impl fmt::Display for PeerAddrInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for addr in self.p2p_addrs() {
            if !first {
                f.write_str(",")?;
            }
            write!(f, "{addr}")?;
            first = false;
        }
        Ok(())
    }
}

impl FromStr for PeerAddrInfo {
    type Err = AddrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_peer_addr(s)
    }
}

/// Parse a `/p2p/`-terminated multiaddr string into a [`PeerAddrInfo`].
///
/// The last component must be `/p2p/<peer-id>` and at least one transport
/// component must precede it.
pub fn parse_peer_addr(addr: &str) -> Result<PeerAddrInfo, AddrError> {
    let maddr: Multiaddr = addr.trim().parse()?;
    peer_addr_from_multiaddr(maddr)
}

/// Split an already parsed multiaddr into peer identity and transport address.
pub fn peer_addr_from_multiaddr(maddr: Multiaddr) -> Result<PeerAddrInfo, AddrError> {
    let mut transport = maddr.clone();
    let peer_id = match transport.pop() {
        Some(Protocol::P2p(peer_id)) => peer_id,
        _ => return Err(AddrError::MissingPeerId(maddr)),
    };

    if transport.is_empty() {
        return Err(AddrError::NoAddress(maddr));
    }

    Ok(PeerAddrInfo {
        peer_id,
        addrs: vec![transport],
    })
}

/// Parse several multiaddr strings, grouping addresses by peer.
///
/// Peers are returned in the order they first appear; duplicate addresses for
/// the same peer are dropped.
pub fn parse_peer_addrs<I, S>(addrs: I) -> Result<Vec<PeerAddrInfo>, AddrError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut infos: Vec<PeerAddrInfo> = Vec::new();
    for addr in addrs {
        let parsed = parse_peer_addr(addr.as_ref())?;
        match infos.iter_mut().find(|info| info.peer_id == parsed.peer_id) {
            Some(existing) => {
                for addr in parsed.addrs {
                    if !existing.addrs.contains(&addr) {
                        existing.addrs.push(addr);
                    }
                }
            }
            None => infos.push(parsed),
        }
    }
    Ok(infos)
}

/// Append `/p2p/<peer>` unless the address already ends with it.
pub fn with_p2p(addr: Multiaddr, peer_id: PeerId) -> Multiaddr {
    match addr.iter().last() {
        Some(Protocol::P2p(existing)) if existing == peer_id => addr,
        _ => addr.with(Protocol::P2p(peer_id)),
    }
}

fn strip_p2p(mut addr: Multiaddr) -> Multiaddr {
    if let Some(Protocol::P2p(_)) = addr.iter().last() {
        addr.pop();
    }
    addr
}
