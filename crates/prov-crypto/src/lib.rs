#![forbid(unsafe_code)]

pub mod hash;
pub mod identity;

pub use identity::{Identity, IdentityError, Keypair, PeerId, PublicKey};

/// Self-describing text encoding for signatures: the first character names
/// the base of the rest.
pub use multibase;
pub use multibase::{Base, Error as MultibaseError};

#[cfg(test)]
mod proptests;
