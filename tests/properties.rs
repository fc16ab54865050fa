//! Property tests for the sign / verify protocol.

use proptest::prelude::*;
use relsign::crypto::ed25519::{generate_keypair, import_keypair_from_bytes};
use relsign::release::signer::sign_digest;
use relsign::release::verify_payload;

fn arb_secret() -> impl Strategy<Value = [u8; 32]> {
    prop::array::uniform32(any::<u8>())
}

proptest! {
    /// Test: a signature made with a key verifies under its public half
    #[test]
    fn test_round_trip(secret in arb_secret(), payload in prop::collection::vec(any::<u8>(), 0..4096)) {
        let keypair = import_keypair_from_bytes(&secret).unwrap();
        let signature = sign_digest(&keypair, &payload);

        prop_assert!(verify_payload(&payload, &signature, &keypair.public_bytes()).unwrap());
    }

    /// Test: signing twice yields identical bytes
    #[test]
    fn test_determinism(secret in arb_secret(), payload in prop::collection::vec(any::<u8>(), 0..1024)) {
        let keypair = import_keypair_from_bytes(&secret).unwrap();

        prop_assert_eq!(sign_digest(&keypair, &payload), sign_digest(&keypair, &payload));
    }

    /// Test: flipping any payload bit turns verification false, not into an error
    #[test]
    fn test_payload_tamper(
        payload in prop::collection::vec(any::<u8>(), 1..512),
        index in any::<prop::sample::Index>(),
        bit in 0u8..8,
    ) {
        let keypair = generate_keypair();
        let signature = sign_digest(&keypair, &payload);

        let mut tampered = payload.clone();
        let i = index.index(tampered.len());
        tampered[i] ^= 1 << bit;

        prop_assert!(!verify_payload(&tampered, &signature, &keypair.public_bytes()).unwrap());
    }

    /// Test: flipping any signature bit turns verification false, not into an error
    #[test]
    fn test_signature_tamper(
        payload in prop::collection::vec(any::<u8>(), 0..512),
        index in 0usize..64,
        bit in 0u8..8,
    ) {
        let keypair = generate_keypair();
        let mut signature = sign_digest(&keypair, &payload);
        signature[index] ^= 1 << bit;

        prop_assert!(!verify_payload(&payload, &signature, &keypair.public_bytes()).unwrap());
    }
}
