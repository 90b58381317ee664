//! Error types for provider record signing and verification.

use prov_crypto::{IdentityError, MultibaseError};
use thiserror::Error;

/// Every way signing or verifying a provider record can fail.
///
/// None of these are transient. [`RecordError::SignatureVerification`] is the
/// only variant that means the record was checked and found untrustworthy;
/// the rest are misuse or malformed input.
#[derive(Debug, Error)]
pub enum RecordError {
    /// The envelope already carries a signature
    #[error("envelope is already signed")]
    AlreadySigned,

    /// No private key was supplied
    #[error("no signing key provided")]
    MissingKey,

    /// The key's identity differs from the claimed identity or the payload ID,
    /// or the payload names no identity at signing time
    #[error("signing key does not match the claimed peer identity")]
    KeyMismatch,

    /// Verification was requested on an unsigned envelope
    #[error("envelope is not signed")]
    NotSigned,

    /// The payload names no peer identity
    #[error("payload does not name a peer identity")]
    MissingIdentity,

    /// The payload's peer identity does not resolve to a public key
    #[error("extracting public key from peer identity: {0}")]
    IdentityExtraction(IdentityError),

    /// The signature text is not valid multibase
    #[error("decoding signature: {0}")]
    SignatureDecode(MultibaseError),

    /// The signature does not match the payload bytes under the peer's key
    #[error("signature failed to verify: untrusted provider claim")]
    SignatureVerification,

    /// The signature primitive itself failed
    #[error("signing payload digest: {0}")]
    Signing(IdentityError),

    /// Malformed JSON on the wire or in a payload
    #[error("malformed provider record: {0}")]
    Codec(#[from] serde_json::Error),
}

impl RecordError {
    /// Whether the record was cryptographically rejected.
    pub fn is_trust_failure(&self) -> bool {
        matches!(self, RecordError::SignatureVerification)
    }
}
