//! Portable password-only protector.

use super::SecretProtector;
use crate::crypto::encryption::{open_secret, seal_secret};
use crate::error::Result;
use zeroize::Zeroizing;

/// Blob tag for password-protected keys.
pub const PASSWORD_TAG: u8 = 1;

/// Protects secrets with an Argon2id-derived key from the password alone.
///
/// Works on every platform. Without a password the key is sealed under the
/// empty password, which only guards against accidental disclosure.
#[derive(Debug, Clone, Copy, Default)]
pub struct PasswordProtector;

impl SecretProtector for PasswordProtector {
    fn protect(&self, secret: &[u8], password: Option<&str>) -> Result<Vec<u8>> {
        if password.is_none() {
            tracing::warn!("password backend used without a password; key is not confidential");
        }
        seal_secret(secret, password.unwrap_or_default().as_bytes(), PASSWORD_TAG)
    }

    fn unprotect(&self, blob: &[u8], password: Option<&str>) -> Result<Zeroizing<Vec<u8>>> {
        open_secret(blob, password.unwrap_or_default().as_bytes(), PASSWORD_TAG)
    }
}
