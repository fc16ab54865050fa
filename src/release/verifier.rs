//! Release verification.
//!
//! Verification is a pure function of payload, signature and public key.
//! A signature that does not match is `Ok(false)`; only inputs that cannot be
//! interpreted as an Ed25519 key or signature are errors.

use crate::crypto::digest::payload_digest;
use crate::crypto::ed25519::{PUBLIC_KEY_LENGTH, SIGNATURE_LENGTH};
use crate::error::{RelSignError, Result};
use crate::release::archive::unpack_archive;
use ed25519_dalek::{Signature, Verifier, VerifyingKey};
use std::fs;
use std::path::Path;

/// Check `signature` over the digest of `payload` against `public_key`.
pub fn verify_payload(payload: &[u8], signature: &[u8], public_key: &[u8]) -> Result<bool> {
    let key_bytes: &[u8; PUBLIC_KEY_LENGTH] = public_key.try_into().map_err(|_| {
        RelSignError::MalformedInputError(format!(
            "public key must be {} bytes, got {}",
            PUBLIC_KEY_LENGTH,
            public_key.len()
        ))
    })?;
    let signature_bytes: &[u8; SIGNATURE_LENGTH] = signature.try_into().map_err(|_| {
        RelSignError::MalformedInputError(format!(
            "signature must be {} bytes, got {}",
            SIGNATURE_LENGTH,
            signature.len()
        ))
    })?;

    let verifying_key = VerifyingKey::from_bytes(key_bytes).map_err(|e| {
        RelSignError::MalformedInputError(format!("public key is not a valid Ed25519 point: {}", e))
    })?;
    let signature = Signature::from_bytes(signature_bytes);

    Ok(verifying_key
        .verify(&payload_digest(payload), &signature)
        .is_ok())
}

/// Verify the release archive at `archive_path` with the public key stored at
/// `public_key_path`.
pub fn verify_release(archive_path: &Path, public_key_path: &Path) -> Result<bool> {
    let public_key = fs::read(public_key_path)?;
    let archive = unpack_archive(archive_path)?;

    let valid = verify_payload(&archive.payload, &archive.signature, &public_key)?;
    tracing::info!(archive = %archive_path.display(), valid, "verified release");
    Ok(valid)
}
