//! Protection of private keys at rest.
//!
//! A [`SecretProtector`] turns raw key bytes into an opaque blob and back.
//! Two backends exist:
//!
//! - [`PasswordProtector`]: portable, the password alone unlocks the key.
//! - [`PlatformProtector`]: binds the key to a per-user machine secret held by
//!   the OS keyring, with the optional password mixed in.

pub mod password;
pub mod platform;

use crate::error::{RelSignError, Result};
use zeroize::Zeroizing;

pub use password::PasswordProtector;
pub use platform::{EphemeralMachineSecret, MachineSecret, PlatformProtector};

/// Protects and recovers secrets at rest.
pub trait SecretProtector {
    /// Protect `secret`, mixing in `password` when one is supplied.
    fn protect(&self, secret: &[u8], password: Option<&str>) -> Result<Vec<u8>>;

    /// Recover a secret produced by [`SecretProtector::protect`].
    ///
    /// Fails with [`RelSignError::DecryptionError`] on a wrong password, a
    /// corrupted blob, or a blob bound to a different machine context.
    fn unprotect(&self, blob: &[u8], password: Option<&str>) -> Result<Zeroizing<Vec<u8>>>;
}

/// Selectable protector backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtectorBackend {
    /// Machine secret in the OS keyring plus optional password.
    Keyring,
    /// Password-derived key only.
    Password,
}

impl ProtectorBackend {
    /// The backend used when none is configured.
    pub fn platform_default() -> Self {
        if cfg!(any(target_os = "windows", target_os = "macos")) {
            ProtectorBackend::Keyring
        } else {
            ProtectorBackend::Password
        }
    }
}

/// Build the protector for `backend`.
pub fn protector_for(backend: ProtectorBackend) -> Result<Box<dyn SecretProtector>> {
    match backend {
        ProtectorBackend::Password => Ok(Box::new(PasswordProtector)),
        ProtectorBackend::Keyring => keyring_protector(),
    }
}

#[cfg(any(target_os = "windows", target_os = "macos"))]
fn keyring_protector() -> Result<Box<dyn SecretProtector>> {
    Ok(Box::new(PlatformProtector::new(
        platform::KeyringMachineSecret::default(),
    )))
}

#[cfg(not(any(target_os = "windows", target_os = "macos")))]
fn keyring_protector() -> Result<Box<dyn SecretProtector>> {
    Err(RelSignError::UnsupportedBackendError(
        "the keyring backend is only available on Windows and macOS; use --backend password"
            .to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_backend_always_available() {
        let protector = protector_for(ProtectorBackend::Password).unwrap();
        let blob = protector.protect(b"secret", Some("pw")).unwrap();
        assert_eq!(
            protector.unprotect(&blob, Some("pw")).unwrap().as_slice(),
            b"secret"
        );
    }

    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    #[test]
    fn test_keyring_backend_unsupported_here() {
        assert!(matches!(
            protector_for(ProtectorBackend::Keyring),
            Err(RelSignError::UnsupportedBackendError(_))
        ));
        assert_eq!(
            ProtectorBackend::platform_default(),
            ProtectorBackend::Password
        );
    }
}
