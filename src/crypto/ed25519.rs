//! Ed25519 key operations.
//!
//! Release keys are plain Ed25519 keypairs. This module only creates and
//! imports them; persistence is left to the keystore and secret protectors.

use crate::error::{RelSignError, Result};
use ed25519_dalek::{Signature, Signer, SigningKey, VerifyingKey};
use rand::rngs::OsRng;

/// Length of a raw Ed25519 secret key.
pub const SECRET_KEY_LENGTH: usize = ed25519_dalek::SECRET_KEY_LENGTH;

/// Length of a raw Ed25519 public key.
pub const PUBLIC_KEY_LENGTH: usize = ed25519_dalek::PUBLIC_KEY_LENGTH;

/// Length of an Ed25519 signature.
pub const SIGNATURE_LENGTH: usize = ed25519_dalek::SIGNATURE_LENGTH;

/// An Ed25519 keypair. The secret half is wiped when the keypair is dropped.
#[derive(Debug, Clone)]
pub struct KeyPair {
    pub secret: SigningKey,
    pub public: VerifyingKey,
}

impl KeyPair {
    /// Create a new keypair from a signing key.
    pub fn from_secret(secret: SigningKey) -> Self {
        let public = secret.verifying_key();
        Self { secret, public }
    }

    /// Get the public key as bytes.
    pub fn public_bytes(&self) -> [u8; PUBLIC_KEY_LENGTH] {
        self.public.to_bytes()
    }

    /// Get the secret key as bytes.
    pub fn secret_bytes(&self) -> [u8; SECRET_KEY_LENGTH] {
        self.secret.to_bytes()
    }

    /// Sign a message.
    pub fn sign(&self, message: &[u8]) -> Signature {
        self.secret.sign(message)
    }
}

/// Generate a new Ed25519 keypair from the operating system's CSPRNG.
///
/// # Example
///
/// ```
/// use relsign::crypto::ed25519::generate_keypair;
///
/// let keypair = generate_keypair();
/// assert_eq!(keypair.public_bytes().len(), 32);
/// ```
pub fn generate_keypair() -> KeyPair {
    KeyPair::from_secret(SigningKey::generate(&mut OsRng))
}

/// Import an Ed25519 keypair from a 32-byte secret key.
///
/// # Example
///
/// ```
/// use relsign::crypto::ed25519::{generate_keypair, import_keypair_from_bytes};
///
/// let keypair = generate_keypair();
/// let imported = import_keypair_from_bytes(&keypair.secret_bytes()).unwrap();
/// assert_eq!(keypair.public_bytes(), imported.public_bytes());
/// ```
pub fn import_keypair_from_bytes(bytes: &[u8]) -> Result<KeyPair> {
    let key_bytes: &[u8; SECRET_KEY_LENGTH] = bytes.try_into().map_err(|_| {
        RelSignError::InvalidKeyError(format!(
            "Expected {} bytes for Ed25519 secret key, got {}",
            SECRET_KEY_LENGTH,
            bytes.len()
        ))
    })?;

    Ok(KeyPair::from_secret(SigningKey::from_bytes(key_bytes)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ed25519_dalek::Verifier;

    #[test]
    fn test_generate_keypair_produces_valid_keys() {
        let keypair = generate_keypair();

        assert_eq!(keypair.public_bytes().len(), PUBLIC_KEY_LENGTH);
        assert_eq!(keypair.secret_bytes().len(), SECRET_KEY_LENGTH);

        let derived = keypair.secret.verifying_key();
        assert_eq!(derived.to_bytes(), keypair.public_bytes());
    }

    #[test]
    fn test_generate_keypair_produces_different_keys() {
        let keypair1 = generate_keypair();
        let keypair2 = generate_keypair();

        assert_ne!(keypair1.public_bytes(), keypair2.public_bytes());
        assert_ne!(keypair1.secret_bytes(), keypair2.secret_bytes());
    }

    #[test]
    fn test_import_from_bytes_valid() {
        let original = generate_keypair();

        let imported = import_keypair_from_bytes(&original.secret_bytes()).unwrap();

        assert_eq!(original.public_bytes(), imported.public_bytes());
        assert_eq!(original.secret_bytes(), imported.secret_bytes());
    }

    #[test]
    fn test_import_from_bytes_invalid_length() {
        let result = import_keypair_from_bytes(&[0u8; 16]);

        match result {
            Err(RelSignError::InvalidKeyError(msg)) => {
                assert!(msg.contains("Expected 32 bytes"));
            }
            _ => panic!("Expected InvalidKeyError"),
        }
    }

    #[test]
    fn test_sign_is_deterministic() {
        let keypair = generate_keypair();
        let message = b"release 1.2.3";

        assert_eq!(
            keypair.sign(message).to_bytes(),
            keypair.sign(message).to_bytes()
        );
    }

    #[test]
    fn test_signature_verifies_against_public_half() {
        let keypair = generate_keypair();
        let signature = keypair.sign(b"payload");

        assert!(keypair.public.verify(b"payload", &signature).is_ok());
        assert!(keypair.public.verify(b"payloaD", &signature).is_err());
    }
}
