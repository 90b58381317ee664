#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use crate::hash::sha256;
    use crate::identity::{extract_public_key, verify_signature, Identity};
    use crate::multibase::{self, Base};

    proptest! {
        // Seed-derived identities resolve back to their own public key
        #[test]
        fn test_peer_id_embeds_public_key(seed in any::<[u8; 32]>()) {
            let identity = Identity::from_seed(seed).unwrap();
            let extracted = extract_public_key(&identity.peer_id()).unwrap();
            prop_assert_eq!(extracted, identity.public_key());
        }

        // Digest signatures verify under the derived key only
        #[test]
        fn test_digest_signature_round_trip(
            seed in any::<[u8; 32]>(),
            message in any::<Vec<u8>>()
        ) {
            let identity = Identity::from_seed(seed).unwrap();
            let digest = sha256(&message);
            let signature = identity.sign(&digest).unwrap();

            let public_key = extract_public_key(&identity.peer_id()).unwrap();
            prop_assert!(verify_signature(&public_key, &digest, &signature));

            let mut tampered = digest;
            tampered[0] ^= 0x01;
            prop_assert!(!verify_signature(&public_key, &tampered, &signature));
        }

        // Signatures survive the text codec unchanged
        #[test]
        fn test_signature_text_encoding(bytes in proptest::collection::vec(any::<u8>(), 64)) {
            let encoded = multibase::encode(Base::Base64, &bytes);
            prop_assert!(encoded.starts_with('m'));
            let (base, decoded) = multibase::decode(&encoded).unwrap();
            prop_assert_eq!(base, Base::Base64);
            prop_assert_eq!(decoded, bytes);
        }
    }
}
