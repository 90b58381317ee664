//! Signed provider records.
//!
//! A provider record is a peer's claim that it can serve a set of
//! content-addressed blocks over a given exchange protocol. The claim is bound
//! to the peer's identity by signing the SHA-256 digest of the exact payload
//! bytes, so a consumer can check it without trusting whoever relayed it.
//!
//! ```text
//! Payload ──new──► UnsignedEnvelope ──sign──► SignedEnvelope ──encode──► wire
//! wire ──decode──► Envelope ──verify──► VerifiedRecord
//! ```

#![forbid(unsafe_code)]

pub mod codec;
pub mod envelope;
pub mod error;
pub mod types;
pub mod verified;

#[cfg(test)]
mod proptests;

pub use codec::{decode_envelope, decode_payload, encode_envelope, encode_payload};
pub use envelope::{Envelope, SignedEnvelope, UnsignedEnvelope};
pub use error::RecordError;
pub use types::{
    Cid, InvalidCid, Payload, RawPayload, ReadProviderResponse, WriteProviderResponse,
    PROTOCOL_BITSWAP,
};
pub use verified::VerifiedRecord;

pub use multiaddr::Multiaddr;
pub use prov_crypto::{Identity, Keypair, PeerId};
