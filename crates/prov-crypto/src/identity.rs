//! Peer identity module.
//!
//! A peer identity is a libp2p [`PeerId`]: a multihash over the protobuf
//! encoding of the peer's public key. For Ed25519 keys the encoding is short
//! enough to be inlined with the identity multihash, which is what allows a
//! verifier to recover the public key from the identity alone.

use ed25519_dalek::SigningKey;
use libp2p_identity::{DecodingError, SigningError};
use rand_core::OsRng;
use zeroize::{Zeroize, Zeroizing};

pub use libp2p_identity::{Keypair, PeerId, PublicKey};

/// Multihash code of the identity hash (digest is the input itself).
const IDENTITY_MULTIHASH_CODE: u64 = 0x00;

/// Error type for identity operations.
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("invalid ed25519 seed: {0}")]
    InvalidSeed(DecodingError),
    #[error("peer ID does not embed a public key (multihash code {0:#x})")]
    KeyNotInlined(u64),
    #[error("invalid public key: {0}")]
    InvalidPublicKey(DecodingError),
    #[error("signing failed: {0}")]
    Signing(#[from] SigningError),
}

/// A peer's signing identity.
///
/// Holds the Ed25519 keypair whose public half determines the [`PeerId`].
#[derive(Clone)]
pub struct Identity {
    keypair: Keypair,
}

impl Identity {
    /// Generate a new random identity using a secure random source.
    pub fn generate() -> Self {
        let sign_key = SigningKey::generate(&mut OsRng);
        Self::from_signing_key(&sign_key)
    }

    /// Fresh random seed for persisting a new identity.
    pub fn generate_seed() -> Zeroizing<[u8; 32]> {
        Zeroizing::new(SigningKey::generate(&mut OsRng).to_bytes())
    }

    /// Create an identity from a 32-byte Ed25519 private key seed.
    ///
    /// The seed is zeroized before returning.
    pub fn from_seed(mut seed: [u8; 32]) -> Result<Self, IdentityError> {
        let result = Keypair::ed25519_from_bytes(&mut seed).map_err(IdentityError::InvalidSeed);
        seed.zeroize();
        Ok(Self { keypair: result? })
    }

    /// Create an identity from an existing Ed25519 signing key.
    pub fn from_signing_key(sign_key: &SigningKey) -> Self {
        let mut seed = sign_key.to_bytes();
        // A 32-byte seed is always a valid Ed25519 secret key.
        let keypair = match Keypair::ed25519_from_bytes(&mut seed) {
            Ok(keypair) => keypair,
            Err(_) => unreachable!("ed25519 seed has the right length"),
        };
        seed.zeroize();
        Self { keypair }
    }

    /// The identity implied by this keypair.
    pub fn peer_id(&self) -> PeerId {
        peer_id_from_keypair(&self.keypair)
    }

    pub fn public_key(&self) -> PublicKey {
        self.keypair.public()
    }

    /// Borrow the underlying keypair for record signing.
    pub fn keypair(&self) -> &Keypair {
        &self.keypair
    }

    /// Sign a message with the identity's private key.
    pub fn sign(&self, message: &[u8]) -> Result<Vec<u8>, IdentityError> {
        Ok(self.keypair.sign(message)?)
    }
}

impl std::fmt::Debug for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Identity")
            .field("peer_id", &self.peer_id())
            .finish_non_exhaustive()
    }
}

/// Derive the peer identity implied by a private key.
pub fn peer_id_from_keypair(keypair: &Keypair) -> PeerId {
    keypair.public().to_peer_id()
}

/// Recover the public key a peer identity was derived from.
///
/// Only identities using the identity multihash carry their key; identities
/// derived by hashing a larger key cannot be resolved without out-of-band
/// key material.
pub fn extract_public_key(peer_id: &PeerId) -> Result<PublicKey, IdentityError> {
    let multihash: &multihash::Multihash<64> = peer_id.as_ref();
    if multihash.code() != IDENTITY_MULTIHASH_CODE {
        return Err(IdentityError::KeyNotInlined(multihash.code()));
    }
    PublicKey::try_decode_protobuf(multihash.digest()).map_err(IdentityError::InvalidPublicKey)
}

/// Verify a signature over `message` with `public_key`.
pub fn verify_signature(public_key: &PublicKey, message: &[u8], signature: &[u8]) -> bool {
    public_key.verify(message, signature)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_generation_is_unique() {
        let a = Identity::generate();
        let b = Identity::generate();
        assert_ne!(a.peer_id(), b.peer_id());
    }

    #[test]
    fn test_from_seed_is_deterministic() {
        let a = Identity::from_seed([7u8; 32]).unwrap();
        let b = Identity::from_seed([7u8; 32]).unwrap();
        assert_eq!(a.peer_id(), b.peer_id());
        assert_eq!(a.public_key(), b.public_key());
    }

    #[test]
    fn test_generated_seeds_differ() {
        let a = Identity::generate_seed();
        let b = Identity::generate_seed();
        assert_ne!(*a, *b);
        assert!(Identity::from_seed(*a).is_ok());
    }

    #[test]
    fn test_from_signing_key_matches_seed() {
        let sign_key = SigningKey::from_bytes(&[9u8; 32]);
        let from_key = Identity::from_signing_key(&sign_key);
        let from_seed = Identity::from_seed([9u8; 32]).unwrap();
        assert_eq!(from_key.peer_id(), from_seed.peer_id());
    }

    #[test]
    fn test_extract_public_key_round_trip() {
        let identity = Identity::generate();
        let extracted = extract_public_key(&identity.peer_id()).unwrap();
        assert_eq!(extracted, identity.public_key());
    }

    #[test]
    fn test_extract_public_key_from_hashed_peer_id_fails() {
        // sha2-256 multihash: not an inlined key
        let mut bytes = vec![0x12, 0x20];
        bytes.extend_from_slice(&[0xAB; 32]);
        let peer_id = PeerId::from_bytes(&bytes).unwrap();

        assert!(matches!(
            extract_public_key(&peer_id),
            Err(IdentityError::KeyNotInlined(0x12))
        ));
    }

    #[test]
    fn test_signature_round_trip() {
        let identity = Identity::generate();
        let message = b"provider record digest";

        let signature = identity.sign(message).unwrap();
        assert!(verify_signature(&identity.public_key(), message, &signature));
    }

    #[test]
    fn test_signature_wrong_message_fails() {
        let identity = Identity::generate();
        let signature = identity.sign(b"Original message").unwrap();

        assert!(!verify_signature(
            &identity.public_key(),
            b"Tampered message",
            &signature
        ));
    }

    #[test]
    fn test_signature_wrong_key_fails() {
        let identity1 = Identity::generate();
        let identity2 = Identity::generate();
        let message = b"Test message";

        let signature = identity1.sign(message).unwrap();
        assert!(!verify_signature(&identity2.public_key(), message, &signature));
    }

    #[test]
    fn test_truncated_signature_fails() {
        let identity = Identity::generate();
        let message = b"Test message";

        let signature = identity.sign(message).unwrap();
        assert!(!verify_signature(
            &identity.public_key(),
            message,
            &signature[..32]
        ));
    }
}
