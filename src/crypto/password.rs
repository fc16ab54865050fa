//! Password-based key derivation using Argon2id.

use crate::error::{RelSignError, Result};
use argon2::Argon2;
use rand::RngCore;
use zeroize::Zeroizing;

/// The length of the salt used for key derivation.
pub const SALT_LENGTH: usize = 32;

/// The length of the derived key.
pub const KEY_LENGTH: usize = 32;

/// Generate a random salt for key derivation.
///
/// # Example
///
/// ```
/// use relsign::crypto::password::{generate_salt, SALT_LENGTH};
///
/// let salt = generate_salt();
/// assert_eq!(salt.len(), SALT_LENGTH);
/// ```
pub fn generate_salt() -> [u8; SALT_LENGTH] {
    let mut salt = [0u8; SALT_LENGTH];
    rand::thread_rng().fill_bytes(&mut salt);
    salt
}

/// Derive an encryption key from secret material and a salt.
///
/// `material` is whatever the protector binds the key to: the password bytes
/// alone, or a machine secret followed by the password bytes.
///
/// # Example
///
/// ```
/// use relsign::crypto::password::{derive_key, generate_salt, KEY_LENGTH};
///
/// let salt = generate_salt();
/// let key = derive_key(b"secure-password", &salt).unwrap();
/// assert_eq!(key.len(), KEY_LENGTH);
/// ```
pub fn derive_key(material: &[u8], salt: &[u8]) -> Result<Zeroizing<[u8; KEY_LENGTH]>> {
    if salt.len() != SALT_LENGTH {
        return Err(RelSignError::KeyDerivationError(format!(
            "Salt must be {} bytes, got {}",
            SALT_LENGTH,
            salt.len()
        )));
    }

    let mut output = Zeroizing::new([0u8; KEY_LENGTH]);
    Argon2::default()
        .hash_password_into(material, salt, &mut *output)
        .map_err(|e| RelSignError::KeyDerivationError(format!("Argon2 error: {}", e)))?;

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_salt_produces_different_values() {
        assert_ne!(generate_salt(), generate_salt());
    }

    #[test]
    fn test_derive_key_same_material_same_salt() {
        let salt = generate_salt();

        let key1 = derive_key(b"test-password", &salt).unwrap();
        let key2 = derive_key(b"test-password", &salt).unwrap();

        assert_eq!(*key1, *key2);
    }

    #[test]
    fn test_derive_key_different_material() {
        let salt = generate_salt();

        let key1 = derive_key(b"password1", &salt).unwrap();
        let key2 = derive_key(b"password2", &salt).unwrap();

        assert_ne!(*key1, *key2);
    }

    #[test]
    fn test_derive_key_invalid_salt_length() {
        let result = derive_key(b"test-password", &[0u8; 16]);

        match result {
            Err(RelSignError::KeyDerivationError(msg)) => {
                assert!(msg.contains("Salt must be"));
            }
            _ => panic!("Expected KeyDerivationError"),
        }
    }

    #[test]
    fn test_derive_key_empty_material() {
        // The password backend without a password derives from empty material
        let salt = generate_salt();
        assert!(derive_key(b"", &salt).is_ok());
    }
}
