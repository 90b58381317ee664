#[cfg(test)]
mod tests {
    use std::time::Duration;

    use chrono::{DateTime, Utc};
    use proptest::prelude::*;
    use prov_crypto::Identity;

    use crate::codec::{decode_envelope, encode_envelope};
    use crate::envelope::{Envelope, SignedEnvelope, UnsignedEnvelope};
    use crate::error::RecordError;
    use crate::types::{Cid, Payload, RawPayload, PROTOCOL_BITSWAP};

    fn payload_strategy(identity: &Identity) -> impl Strategy<Value = Payload> {
        let peer_id = identity.peer_id();
        (
            proptest::collection::vec("bafy[a-z2-7]{8,40}", 0..8),
            proptest::option::of(0i64..4_102_444_800_000),
            proptest::option::of(0u64..1_000_000_000),
            proptest::collection::vec((any::<[u8; 4]>(), 1u16..=u16::MAX), 0..4),
        )
            .prop_map(move |(keys, timestamp, ttl, addrs)| Payload {
                keys: keys.into_iter().map(|k| k.parse::<Cid>().unwrap()).collect(),
                timestamp: timestamp.and_then(DateTime::<Utc>::from_timestamp_millis),
                advisory_ttl: ttl.map(Duration::from_millis),
                id: Some(peer_id),
                addrs: addrs
                    .into_iter()
                    .map(|([a, b, c, d], port)| {
                        format!("/ip4/{a}.{b}.{c}.{d}/tcp/{port}").parse().unwrap()
                    })
                    .collect(),
            })
    }

    proptest! {
        // A self-attested claim verifies after a trip over the wire
        #[test]
        fn test_signed_payload_verifies_after_wire_trip(
            seed in any::<[u8; 32]>(),
            payload in payload_strategy(&Identity::from_seed([42u8; 32]).unwrap()),
        ) {
            let identity = Identity::from_seed(seed).unwrap();
            let payload = Payload { id: Some(identity.peer_id()), ..payload };

            let mut envelope: Envelope = UnsignedEnvelope::new(PROTOCOL_BITSWAP, payload.clone()).into();
            envelope.sign(&identity.peer_id(), Some(identity.keypair())).unwrap();

            let bytes = encode_envelope(&envelope).unwrap();
            let decoded = decode_envelope(&bytes).unwrap();

            prop_assert_eq!(decoded.payload(), &payload);
            prop_assert_eq!(decoded.raw_payload(), envelope.raw_payload());
            prop_assert!(decoded.verify().is_ok());
        }

        // Any single changed byte in the signed bytes is rejected
        #[test]
        fn test_tampered_payload_bytes_are_rejected(
            payload in payload_strategy(&Identity::from_seed([7u8; 32]).unwrap()),
            pad in 1usize..4,
        ) {
            let identity = Identity::from_seed([7u8; 32]).unwrap();
            let signed = UnsignedEnvelope::new(PROTOCOL_BITSWAP, payload)
                .sign(&identity.peer_id(), identity.keypair())
                .unwrap();

            // Leading spaces inside the object keep the JSON equal but change the bytes
            let original = signed.raw_payload().as_str();
            let padded = format!("{{{}{}", " ".repeat(pad), &original[1..]);
            let raw = RawPayload::from_string(padded).unwrap();

            let tampered = SignedEnvelope::from_parts(signed.protocol(), signed.signature(), raw).unwrap();
            prop_assert_eq!(tampered.payload(), signed.payload());
            prop_assert!(matches!(tampered.verify(), Err(RecordError::SignatureVerification)));
        }
    }
}
