//! Sealed-blob encryption for private keys.
//!
//! Secrets are encrypted with AES-256-GCM under a key derived with Argon2 from
//! protector-specific material. The sealed format is:
//! [backend tag (1 byte)][salt (32 bytes)][nonce (12 bytes)][ciphertext (variable)]
//!
//! The backend tag is authenticated as associated data, so a blob written by
//! one protector backend can never be opened by another.

use crate::crypto::password::{derive_key, generate_salt, SALT_LENGTH};
use crate::error::{RelSignError, Result};
use aes_gcm::{
    aead::{Aead, KeyInit, Payload},
    Aes256Gcm,
};
use rand::RngCore;
use zeroize::Zeroizing;

/// The length of the nonce used for AES-GCM encryption.
const NONCE_LENGTH: usize = 12;

/// Bytes preceding the ciphertext.
pub const HEADER_LENGTH: usize = 1 + SALT_LENGTH + NONCE_LENGTH;

/// Encrypt `secret` under a key derived from `material`.
///
/// # Example
///
/// ```
/// use relsign::crypto::encryption::{open_secret, seal_secret};
///
/// let sealed = seal_secret(b"this is a secret key", b"secure-password", 1).unwrap();
/// let opened = open_secret(&sealed, b"secure-password", 1).unwrap();
///
/// assert_eq!(b"this is a secret key".as_slice(), opened.as_slice());
/// ```
pub fn seal_secret(secret: &[u8], material: &[u8], tag: u8) -> Result<Vec<u8>> {
    let salt = generate_salt();
    let derived_key = derive_key(material, &salt)?;

    let mut nonce_bytes = [0u8; NONCE_LENGTH];
    rand::thread_rng().fill_bytes(&mut nonce_bytes);

    let cipher = Aes256Gcm::new_from_slice(derived_key.as_slice())
        .map_err(|e| RelSignError::EncryptionError(format!("Invalid key length: {}", e)))?;
    let aad = [tag];
    let ciphertext = cipher
        .encrypt(
            &nonce_bytes.into(),
            Payload {
                msg: secret,
                aad: &aad,
            },
        )
        .map_err(|e| RelSignError::EncryptionError(format!("Encryption failed: {}", e)))?;

    let mut output = Vec::with_capacity(HEADER_LENGTH + ciphertext.len());
    output.push(tag);
    output.extend_from_slice(&salt);
    output.extend_from_slice(&nonce_bytes);
    output.extend_from_slice(&ciphertext);

    Ok(output)
}

/// Decrypt a blob produced by [`seal_secret`].
///
/// Every failure mode is reported as [`RelSignError::DecryptionError`] and no
/// plaintext is returned unless authentication succeeds.
pub fn open_secret(sealed: &[u8], material: &[u8], tag: u8) -> Result<Zeroizing<Vec<u8>>> {
    if sealed.len() < HEADER_LENGTH {
        return Err(RelSignError::DecryptionError(format!(
            "Protected key too short: expected at least {} bytes, got {}",
            HEADER_LENGTH,
            sealed.len()
        )));
    }

    if sealed[0] != tag {
        return Err(RelSignError::DecryptionError(format!(
            "Protected key was written by a different backend (tag {}, expected {})",
            sealed[0], tag
        )));
    }

    let salt = &sealed[1..1 + SALT_LENGTH];
    let nonce_bytes = &sealed[1 + SALT_LENGTH..HEADER_LENGTH];
    let ciphertext = &sealed[HEADER_LENGTH..];

    let derived_key = derive_key(material, salt)?;
    let cipher = Aes256Gcm::new_from_slice(derived_key.as_slice())
        .map_err(|e| RelSignError::EncryptionError(format!("Invalid key length: {}", e)))?;

    let aad = [tag];
    let plaintext = cipher
        .decrypt(
            nonce_bytes.into(),
            Payload {
                msg: ciphertext,
                aad: &aad,
            },
        )
        .map_err(|_| {
            RelSignError::DecryptionError(
                "wrong password, corrupted key file, or key protected for another user".to_string(),
            )
        })?;

    Ok(Zeroizing::new(plaintext))
}
