//! A provider record whose signature has been checked.

use chrono::{DateTime, Utc};
use prov_crypto::PeerId;

use crate::envelope::SignedEnvelope;
use crate::types::{Payload, RawPayload, ReadProviderResponse};

/// Witness that a [`SignedEnvelope`]'s signature is valid for its peer.
///
/// Only [`SignedEnvelope::into_verified`] constructs this type, so holding one
/// means the claim was checked. It is read-only.
#[derive(Debug, Clone)]
pub struct VerifiedRecord {
    envelope: SignedEnvelope,
    peer_id: PeerId,
}

impl VerifiedRecord {
    pub(crate) fn new(envelope: SignedEnvelope, peer_id: PeerId) -> Self {
        Self { envelope, peer_id }
    }

    /// The peer that signed the claim.
    pub fn peer_id(&self) -> &PeerId {
        &self.peer_id
    }

    pub fn protocol(&self) -> &str {
        self.envelope.protocol()
    }

    pub fn payload(&self) -> &Payload {
        self.envelope.payload()
    }

    pub fn raw_payload(&self) -> &RawPayload {
        self.envelope.raw_payload()
    }

    pub fn signature(&self) -> &str {
        self.envelope.signature()
    }

    /// When the advisory TTL runs out, if the claim carries both a timestamp
    /// and a TTL. Advisory only: an elapsed TTL does not invalidate the
    /// signature.
    pub fn advisory_expiry(&self) -> Option<DateTime<Utc>> {
        let payload = self.payload();
        let ttl = chrono::Duration::from_std(payload.advisory_ttl?).ok()?;
        payload.timestamp?.checked_add_signed(ttl)
    }

    /// Read-path view of this provider.
    pub fn read_response(&self) -> ReadProviderResponse {
        ReadProviderResponse {
            protocol: self.protocol().to_string(),
            id: Some(self.peer_id),
            addrs: self.payload().addrs.clone(),
        }
    }
}
