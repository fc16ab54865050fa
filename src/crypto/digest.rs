//! Payload digests.
//!
//! Release payloads are never signed directly: the signer and the verifier
//! both operate on the SHA-256 digest of the payload bytes.

use sha2::{Digest, Sha256};

/// Length of a payload digest in bytes.
pub const DIGEST_LENGTH: usize = 32;

/// Compute the SHA-256 digest of a release payload.
pub fn payload_digest(payload: &[u8]) -> [u8; DIGEST_LENGTH] {
    Sha256::digest(payload).into()
}
