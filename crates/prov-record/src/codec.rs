//! Wire encoding of provider records.
//!
//! The outer envelope is JSON with three members: `Protocol`, `Signature` and
//! `Payload`. Decoding captures the `Payload` member as raw bytes before
//! parsing it, so the bytes a signature covers are never re-serialized.

use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;
use tracing::trace;

use crate::envelope::{Envelope, SignedEnvelope, UnsignedEnvelope};
use crate::error::RecordError;
use crate::types::{Payload, RawPayload};

#[derive(Deserialize)]
struct WireEnvelopeIn {
    #[serde(rename = "Protocol", default)]
    protocol: String,
    #[serde(rename = "Signature", default)]
    signature: Option<String>,
    #[serde(rename = "Payload")]
    payload: Box<RawValue>,
}

#[derive(Serialize)]
struct WireEnvelopeOut<'a> {
    #[serde(rename = "Protocol")]
    protocol: &'a str,
    #[serde(rename = "Signature")]
    signature: &'a str,
    #[serde(rename = "Payload")]
    payload: &'a RawValue,
}

/// Canonical compact encoding of a payload.
pub fn encode_payload(payload: &Payload) -> Result<RawPayload, RecordError> {
    RawPayload::from_string(serde_json::to_string(payload)?)
}

/// Parse payload bytes. A JSON `null` payload is an empty claim.
pub fn decode_payload(raw: &RawPayload) -> Result<Payload, RecordError> {
    let payload: Option<Payload> = serde_json::from_str(raw.as_str())?;
    Ok(payload.unwrap_or_default())
}

/// Decode a wire envelope, keeping the payload bytes exactly as received.
///
/// A missing or empty `Signature` yields an unsigned envelope.
pub fn decode_envelope(bytes: &[u8]) -> Result<Envelope, RecordError> {
    let wire: WireEnvelopeIn = serde_json::from_slice(bytes)?;
    let raw_payload = RawPayload::from_raw_value(wire.payload);

    let envelope: Envelope = match wire.signature.filter(|s| !s.is_empty()) {
        Some(signature) => {
            SignedEnvelope::from_parts(wire.protocol, signature, raw_payload)?.into()
        }
        None => UnsignedEnvelope::from_raw_payload(wire.protocol, raw_payload)?.into(),
    };

    trace!(
        protocol = envelope.protocol(),
        signed = envelope.is_signed(),
        payload_len = envelope.raw_payload().map_or(0, |raw| raw.as_bytes().len()),
        "decoded provider envelope"
    );
    Ok(envelope)
}

/// Encode an envelope for the wire, embedding its payload bytes verbatim.
///
/// Unsigned envelopes without payload bytes get a fresh canonical encoding
/// and an empty `Signature`.
pub fn encode_envelope(envelope: &Envelope) -> Result<Vec<u8>, RecordError> {
    let synthesized;
    let raw_payload = match envelope.raw_payload() {
        Some(raw) => raw,
        None => {
            synthesized = encode_payload(envelope.payload())?;
            &synthesized
        }
    };

    let wire = WireEnvelopeOut {
        protocol: envelope.protocol(),
        signature: envelope.signature().unwrap_or_default(),
        payload: raw_payload.as_raw_value(),
    };
    Ok(serde_json::to_vec(&wire)?)
}
