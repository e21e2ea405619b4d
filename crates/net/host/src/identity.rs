use libp2p::identity::Keypair;
use rand::{RngCore, SeedableRng, rngs::StdRng};

use crate::HostError;

/// Ed25519 host key. The same seed always yields the same key; without a
/// seed, or with seed 0, a fresh random key is generated.
pub fn keypair_from_seed(seed: Option<u64>) -> Result<Keypair, HostError> {
    let Some(seed) = seed.filter(|&seed| seed != 0) else {
        return Ok(Keypair::generate_ed25519());
    };

    let mut secret = [0u8; 32];
    StdRng::seed_from_u64(seed).fill_bytes(&mut secret);
    Ok(Keypair::ed25519_from_bytes(secret)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_key_is_deterministic() {
        let a = keypair_from_seed(Some(42)).unwrap();
        let b = keypair_from_seed(Some(42)).unwrap();
        assert_eq!(a.public().to_peer_id(), b.public().to_peer_id());
    }

    #[test]
    fn different_seeds_differ() {
        let a = keypair_from_seed(Some(1)).unwrap();
        let b = keypair_from_seed(Some(2)).unwrap();
        assert_ne!(a.public().to_peer_id(), b.public().to_peer_id());
    }

    #[test]
    fn unseeded_keys_are_random() {
        let a = keypair_from_seed(None).unwrap();
        let b = keypair_from_seed(None).unwrap();
        assert_ne!(a.public().to_peer_id(), b.public().to_peer_id());
    }

    #[test]
    fn zero_seed_is_random() {
        let a = keypair_from_seed(Some(0)).unwrap();
        let b = keypair_from_seed(Some(0)).unwrap();
        assert_ne!(a.public().to_peer_id(), b.public().to_peer_id());
    }

    #[test]
    fn keys_are_ed25519() {
        let key = keypair_from_seed(Some(7)).unwrap();
        assert!(key.try_into_ed25519().is_ok());
    }
}
