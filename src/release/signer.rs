//! Release signing.
//!
//! Payloads are signed digest-first: the Ed25519 signature covers the SHA-256
//! digest of the payload, not the payload itself.

use crate::crypto::digest::payload_digest;
use crate::crypto::ed25519::{import_keypair_from_bytes, KeyPair, SIGNATURE_LENGTH};
use crate::error::Result;
use crate::protect::SecretProtector;
use crate::release::archive::build_archive;
use crate::storage::keystore::KeyStore;
use std::fs;
use std::path::{Path, PathBuf};

/// Outcome of [`sign_release`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedRelease {
    /// The archive that was written.
    pub output: PathBuf,
    /// Where a pre-existing file at `output` was moved, if there was one.
    pub backup: Option<PathBuf>,
    /// Size of the written archive in bytes.
    pub size: u64,
}

/// Sign the digest of `payload` with an in-memory keypair.
pub fn sign_digest(keypair: &KeyPair, payload: &[u8]) -> [u8; SIGNATURE_LENGTH] {
    keypair.sign(&payload_digest(payload)).to_bytes()
}

/// Sign `payload` with the stored key `key_name`.
///
/// The key is loaded from `store`, recovered with `protector` and dropped
/// before this function returns.
pub fn sign_payload(
    store: &KeyStore,
    protector: &dyn SecretProtector,
    password: Option<&str>,
    payload: &[u8],
    key_name: &str,
) -> Result<[u8; SIGNATURE_LENGTH]> {
    let blob = store.read(key_name)?;
    let secret = protector.unprotect(&blob, password)?;
    let keypair = import_keypair_from_bytes(&secret)?;

    tracing::debug!(key = key_name, bytes = payload.len(), "signing payload digest");
    Ok(sign_digest(&keypair, payload))
}

/// Sign the file at `input` and package it with its signature at `output`.
pub fn sign_release(
    store: &KeyStore,
    protector: &dyn SecretProtector,
    password: Option<&str>,
    input: &Path,
    output: &Path,
    key_name: &str,
) -> Result<SignedRelease> {
    let payload = fs::read(input)?;
    let signature = sign_payload(store, protector, password, &payload, key_name)?;

    let backup = build_archive(&payload, &signature, output)?;
    let size = fs::metadata(output)?.len();

    tracing::info!(
        input = %input.display(),
        output = %output.display(),
        key = key_name,
        "signed release"
    );
    Ok(SignedRelease {
        output: output.to_path_buf(),
        backup,
        size,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::ed25519::generate_keypair;
    use crate::error::RelSignError;
    use crate::protect::PasswordProtector;
    use crate::storage::keystore::CURRENT_KEY_NAME;
    use ed25519_dalek::{Signature, Verifier};
    use tempfile::TempDir;

    fn store_with_key(keypair: &KeyPair, password: Option<&str>) -> (TempDir, KeyStore) {
        let temp_dir = TempDir::new().unwrap();
        let store = KeyStore::new(temp_dir.path());
        let blob = PasswordProtector
            .protect(&keypair.secret_bytes(), password)
            .unwrap();
        store.write_current(&blob).unwrap();
        (temp_dir, store)
    }

    #[test]
    fn test_signature_covers_digest() {
        let keypair = generate_keypair();
        let signature = Signature::from_bytes(&sign_digest(&keypair, b"payload"));

        assert!(keypair
            .public
            .verify(&payload_digest(b"payload"), &signature)
            .is_ok());
        assert!(keypair.public.verify(b"payload", &signature).is_err());
    }

    #[test]
    fn test_sign_payload_is_deterministic() {
        let keypair = generate_keypair();
        let (_temp_dir, store) = store_with_key(&keypair, Some("abc"));

        let first =
            sign_payload(&store, &PasswordProtector, Some("abc"), b"payload", CURRENT_KEY_NAME)
                .unwrap();
        let second =
            sign_payload(&store, &PasswordProtector, Some("abc"), b"payload", CURRENT_KEY_NAME)
                .unwrap();

        assert_eq!(first, second);
        assert_eq!(first, sign_digest(&keypair, b"payload"));
    }

    #[test]
    fn test_sign_payload_missing_key() {
        let temp_dir = TempDir::new().unwrap();
        let store = KeyStore::new(temp_dir.path());

        let result = sign_payload(&store, &PasswordProtector, None, b"payload", "1.0.0");
        assert!(matches!(result, Err(RelSignError::MissingKeyError(_))));
    }

    #[test]
    fn test_sign_payload_wrong_password() {
        let keypair = generate_keypair();
        let (_temp_dir, store) = store_with_key(&keypair, Some("abc"));

        let result =
            sign_payload(&store, &PasswordProtector, Some("xyz"), b"payload", CURRENT_KEY_NAME);
        assert!(matches!(result, Err(RelSignError::DecryptionError(_))));
    }

    #[test]
    fn test_sign_release_missing_input_writes_nothing() {
        let keypair = generate_keypair();
        let (temp_dir, store) = store_with_key(&keypair, None);
        let output = temp_dir.path().join("out.zip");

        let result = sign_release(
            &store,
            &PasswordProtector,
            None,
            &temp_dir.path().join("missing.zip"),
            &output,
            CURRENT_KEY_NAME,
        );

        assert!(matches!(result, Err(RelSignError::StorageError(_))));
        assert!(!output.exists());
    }
}
