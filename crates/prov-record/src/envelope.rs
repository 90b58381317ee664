//! Provider record envelopes and their signing state.
//!
//! Signing is a one-way transition from [`UnsignedEnvelope`] to
//! [`SignedEnvelope`]; a signed envelope has no signing method at all.
//! [`Envelope`] covers values decoded from the wire, whose state is only known
//! at runtime.
//!
//! A signed envelope always carries the payload bytes its signature covers.
//! Verification digests exactly those bytes and never re-encodes the parsed
//! payload.

use prov_crypto::hash::sha256;
use prov_crypto::identity::{self, Keypair, PeerId};
use prov_crypto::multibase::{self, Base};
use tracing::debug;

use crate::codec;
use crate::error::RecordError;
use crate::types::{Payload, RawPayload};
use crate::verified::VerifiedRecord;

/// A provider claim that has not been signed yet.
#[derive(Debug, Clone, PartialEq)]
pub struct UnsignedEnvelope {
    protocol: String,
    payload: Payload,
    raw_payload: Option<RawPayload>,
}

impl UnsignedEnvelope {
    /// Wrap a structured payload. Its bytes are produced when it is signed.
    pub fn new(protocol: impl Into<String>, payload: Payload) -> Self {
        Self {
            protocol: protocol.into(),
            payload,
            raw_payload: None,
        }
    }

    /// Wrap payload bytes that must be signed exactly as given.
    pub fn from_raw_payload(
        protocol: impl Into<String>,
        raw_payload: RawPayload,
    ) -> Result<Self, RecordError> {
        let payload = codec::decode_payload(&raw_payload)?;
        Ok(Self {
            protocol: protocol.into(),
            payload,
            raw_payload: Some(raw_payload),
        })
    }

    pub fn protocol(&self) -> &str {
        &self.protocol
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    pub fn raw_payload(&self) -> Option<&RawPayload> {
        self.raw_payload.as_ref()
    }

    /// Sign the payload as `peer_id`.
    ///
    /// `key` must derive to `peer_id`, and the payload must name the same
    /// identity; otherwise this fails with [`RecordError::KeyMismatch`]. Existing payload bytes are reused; otherwise the canonical
    /// encoding is signed. On failure nothing is produced.
    pub fn sign(&self, peer_id: &PeerId, key: &Keypair) -> Result<SignedEnvelope, RecordError> {
        let signer = identity::peer_id_from_keypair(key);
        if signer != *peer_id {
            return Err(RecordError::KeyMismatch);
        }
        // A payload naming no peer cannot match the signer either
        if self.payload.id != Some(signer) {
            return Err(RecordError::KeyMismatch);
        }

        let raw_payload = match &self.raw_payload {
            Some(raw) => raw.clone(),
            None => codec::encode_payload(&self.payload)?,
        };

        let digest = sha256(raw_payload.as_bytes());
        let signature = key
            .sign(&digest)
            .map_err(|e| RecordError::Signing(e.into()))?;

        debug!(
            peer_id = %signer,
            keys = self.payload.keys.len(),
            payload_len = raw_payload.as_bytes().len(),
            "signed provider record"
        );

        Ok(SignedEnvelope {
            protocol: self.protocol.clone(),
            signature: multibase::encode(Base::Base64, &signature),
            raw_payload,
            payload: self.payload.clone(),
        })
    }
}

/// A provider claim carrying a signature that may not have been checked.
#[derive(Debug, Clone, PartialEq)]
pub struct SignedEnvelope {
    protocol: String,
    signature: String,
    raw_payload: RawPayload,
    payload: Payload,
}

impl SignedEnvelope {
    /// Assemble a signed envelope from the signature and the exact bytes it
    /// was computed over.
    pub fn from_parts(
        protocol: impl Into<String>,
        signature: impl Into<String>,
        raw_payload: RawPayload,
    ) -> Result<Self, RecordError> {
        let signature = signature.into();
        if signature.is_empty() {
            return Err(RecordError::NotSigned);
        }
        let payload = codec::decode_payload(&raw_payload)?;
        Ok(Self {
            protocol: protocol.into(),
            signature,
            raw_payload,
            payload,
        })
    }

    pub fn protocol(&self) -> &str {
        &self.protocol
    }

    /// Multibase text of the signature.
    pub fn signature(&self) -> &str {
        &self.signature
    }

    pub fn raw_payload(&self) -> &RawPayload {
        &self.raw_payload
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    /// Check the signature against the payload bytes under the public key
    /// embedded in the payload's peer identity.
    pub fn verify(&self) -> Result<(), RecordError> {
        self.verified_signer().map(|_| ())
    }

    /// Verify and return the witness type that exposes the checked claim.
    pub fn into_verified(self) -> Result<VerifiedRecord, RecordError> {
        let peer_id = self.verified_signer()?;
        Ok(VerifiedRecord::new(self, peer_id))
    }

    fn verified_signer(&self) -> Result<PeerId, RecordError> {
        let peer_id = self.payload.id.ok_or(RecordError::MissingIdentity)?;
        let public_key =
            identity::extract_public_key(&peer_id).map_err(RecordError::IdentityExtraction)?;
        let (_, signature) =
            multibase::decode(&self.signature).map_err(RecordError::SignatureDecode)?;

        let digest = sha256(self.raw_payload.as_bytes());
        if !identity::verify_signature(&public_key, &digest, &signature) {
            debug!(peer_id = %peer_id, "provider record signature rejected");
            return Err(RecordError::SignatureVerification);
        }

        debug!(peer_id = %peer_id, "provider record signature verified");
        Ok(peer_id)
    }
}

/// An envelope whose signing state is known only at runtime.
#[derive(Debug, Clone, PartialEq)]
pub enum Envelope {
    Unsigned(UnsignedEnvelope),
    Signed(SignedEnvelope),
}

impl Envelope {
    pub fn is_signed(&self) -> bool {
        matches!(self, Envelope::Signed(_))
    }

    pub fn protocol(&self) -> &str {
        match self {
            Envelope::Unsigned(env) => env.protocol(),
            Envelope::Signed(env) => env.protocol(),
        }
    }

    pub fn payload(&self) -> &Payload {
        match self {
            Envelope::Unsigned(env) => env.payload(),
            Envelope::Signed(env) => env.payload(),
        }
    }

    pub fn raw_payload(&self) -> Option<&RawPayload> {
        match self {
            Envelope::Unsigned(env) => env.raw_payload(),
            Envelope::Signed(env) => Some(env.raw_payload()),
        }
    }

    pub fn signature(&self) -> Option<&str> {
        match self {
            Envelope::Unsigned(_) => None,
            Envelope::Signed(env) => Some(env.signature()),
        }
    }

    /// Sign in place. The envelope is replaced only if signing succeeds.
    pub fn sign(&mut self, peer_id: &PeerId, key: Option<&Keypair>) -> Result<(), RecordError> {
        let signed = match self {
            Envelope::Signed(_) => return Err(RecordError::AlreadySigned),
            Envelope::Unsigned(env) => {
                let key = key.ok_or(RecordError::MissingKey)?;
                env.sign(peer_id, key)?
            }
        };
        *self = Envelope::Signed(signed);
        Ok(())
    }

    pub fn verify(&self) -> Result<(), RecordError> {
        match self {
            Envelope::Unsigned(_) => Err(RecordError::NotSigned),
            Envelope::Signed(env) => env.verify(),
        }
    }

    pub fn into_verified(self) -> Result<VerifiedRecord, RecordError> {
        match self {
            Envelope::Unsigned(_) => Err(RecordError::NotSigned),
            Envelope::Signed(env) => env.into_verified(),
        }
    }
}

impl From<UnsignedEnvelope> for Envelope {
    fn from(env: UnsignedEnvelope) -> Self {
        Envelope::Unsigned(env)
    }
}

impl From<SignedEnvelope> for Envelope {
    fn from(env: SignedEnvelope) -> Self {
        Envelope::Signed(env)
    }
}
