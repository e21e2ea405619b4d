//! Fixed-size ping payload.

use rand::Rng;

use crate::PING_LENGTH;

/// The opaque bytes sent in every probe.
///
/// Generated once per [`Initiator`](crate::Initiator) and reused unchanged for
/// every round; only its length and the exactness of the echo matter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Payload([u8; PING_LENGTH]);

impl Payload {
    /// Payload filled from the thread-local RNG.
    pub fn random() -> Self {
        let mut bytes = [0u8; PING_LENGTH];
        rand::rng().fill(&mut bytes);
        Self(bytes)
    }

    pub const fn from_bytes(bytes: [u8; PING_LENGTH]) -> Self {
        Self(bytes)
    }

    pub const fn as_bytes(&self) -> &[u8; PING_LENGTH] {
        &self.0
    }
}

impl AsRef<[u8]> for Payload {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; PING_LENGTH]> for Payload {
    fn from(bytes: [u8; PING_LENGTH]) -> Self {
        Self(bytes)
    }
}
