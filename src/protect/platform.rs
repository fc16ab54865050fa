//! Machine-bound protector.
//!
//! The sealing key is derived from a random per-user machine secret followed
//! by the optional password, so recovering a key needs both the same user
//! context and the same password.

use super::SecretProtector;
use crate::crypto::encryption::{open_secret, seal_secret};
use crate::error::{RelSignError, Result};
use rand::RngCore;
use std::sync::Mutex;
use zeroize::Zeroizing;

/// Blob tag for machine-bound keys.
pub const PLATFORM_TAG: u8 = 2;

/// Length of a machine secret.
pub const MACHINE_SECRET_LENGTH: usize = 32;

/// Source of the per-user machine secret.
pub trait MachineSecret {
    /// Return the machine secret, or `None` if this context has never created one.
    fn load(&self) -> Result<Option<Zeroizing<[u8; MACHINE_SECRET_LENGTH]>>>;

    /// Return the machine secret, creating and storing it on first use.
    fn load_or_create(&self) -> Result<Zeroizing<[u8; MACHINE_SECRET_LENGTH]>>;
}

/// Protects secrets under a machine secret plus optional password.
#[derive(Debug)]
pub struct PlatformProtector<S> {
    source: S,
}

impl<S: MachineSecret> PlatformProtector<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }
}

fn key_material(machine: &[u8; MACHINE_SECRET_LENGTH], password: Option<&str>) -> Zeroizing<Vec<u8>> {
    let password = password.unwrap_or_default().as_bytes();
    let mut material = Zeroizing::new(Vec::with_capacity(MACHINE_SECRET_LENGTH + password.len()));
    material.extend_from_slice(machine);
    material.extend_from_slice(password);
    material
}

impl<S: MachineSecret> SecretProtector for PlatformProtector<S> {
    fn protect(&self, secret: &[u8], password: Option<&str>) -> Result<Vec<u8>> {
        let machine = self.source.load_or_create()?;
        seal_secret(secret, &key_material(&machine, password), PLATFORM_TAG)
    }

    fn unprotect(&self, blob: &[u8], password: Option<&str>) -> Result<Zeroizing<Vec<u8>>> {
        let machine = self.source.load()?.ok_or_else(|| {
            RelSignError::DecryptionError(
                "no machine secret exists for this user; the key was protected elsewhere"
                    .to_string(),
            )
        })?;
        open_secret(blob, &key_material(&machine, password), PLATFORM_TAG)
    }
}

/// A machine secret that lives only as long as this value.
///
/// Used for tests and for keys that must never outlive the process.
#[derive(Debug, Default)]
pub struct EphemeralMachineSecret {
    secret: Mutex<Option<[u8; MACHINE_SECRET_LENGTH]>>,
}

impl MachineSecret for EphemeralMachineSecret {
    fn load(&self) -> Result<Option<Zeroizing<[u8; MACHINE_SECRET_LENGTH]>>> {
        let guard = self
            .secret
            .lock()
            .map_err(|_| RelSignError::KeyringError("machine secret lock poisoned".to_string()))?;
        Ok((*guard).map(Zeroizing::new))
    }

    fn load_or_create(&self) -> Result<Zeroizing<[u8; MACHINE_SECRET_LENGTH]>> {
        let mut guard = self
            .secret
            .lock()
            .map_err(|_| RelSignError::KeyringError("machine secret lock poisoned".to_string()))?;
        let secret = guard.get_or_insert_with(|| {
            let mut bytes = [0u8; MACHINE_SECRET_LENGTH];
            rand::thread_rng().fill_bytes(&mut bytes);
            bytes
        });
        Ok(Zeroizing::new(*secret))
    }
}

/// Machine secret stored hex-encoded in the OS keyring of the current user.
#[cfg(any(target_os = "windows", target_os = "macos"))]
#[derive(Debug, Clone)]
pub struct KeyringMachineSecret {
    service: String,
    user: String,
}

#[cfg(any(target_os = "windows", target_os = "macos"))]
impl Default for KeyringMachineSecret {
    fn default() -> Self {
        Self {
            service: "relsign".to_string(),
            user: "machine-secret".to_string(),
        }
    }
}

#[cfg(any(target_os = "windows", target_os = "macos"))]
impl KeyringMachineSecret {
    fn entry(&self) -> Result<keyring::Entry> {
        keyring::Entry::new(&self.service, &self.user)
            .map_err(|e| RelSignError::KeyringError(e.to_string()))
    }
}

#[cfg(any(target_os = "windows", target_os = "macos"))]
impl MachineSecret for KeyringMachineSecret {
    fn load(&self) -> Result<Option<Zeroizing<[u8; MACHINE_SECRET_LENGTH]>>> {
        let encoded = match self.entry()?.get_password() {
            Ok(encoded) => Zeroizing::new(encoded),
            Err(keyring::Error::NoEntry) => return Ok(None),
            Err(e) => return Err(RelSignError::KeyringError(e.to_string())),
        };

        let bytes = Zeroizing::new(
            hex::decode(encoded.as_str())
                .map_err(|_| RelSignError::KeyringError("machine secret is corrupted".to_string()))?,
        );
        let secret: [u8; MACHINE_SECRET_LENGTH] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| RelSignError::KeyringError("machine secret is corrupted".to_string()))?;
        Ok(Some(Zeroizing::new(secret)))
    }

    fn load_or_create(&self) -> Result<Zeroizing<[u8; MACHINE_SECRET_LENGTH]>> {
        if let Some(secret) = self.load()? {
            return Ok(secret);
        }

        let mut secret = Zeroizing::new([0u8; MACHINE_SECRET_LENGTH]);
        rand::thread_rng().fill_bytes(secret.as_mut_slice());
        let encoded = Zeroizing::new(hex::encode(secret.as_slice()));
        self.entry()?
            .set_password(&encoded)
            .map_err(|e| RelSignError::KeyringError(e.to_string()))?;
        tracing::info!(service = %self.service, "created machine secret in OS keyring");
        Ok(secret)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip_same_context() {
        let protector = PlatformProtector::new(EphemeralMachineSecret::default());

        let blob = protector.protect(b"key bytes", Some("abc")).unwrap();
        let secret = protector.unprotect(&blob, Some("abc")).unwrap();

        assert_eq!(secret.as_slice(), b"key bytes");
    }

    #[test]
    fn test_roundtrip_without_password() {
        let protector = PlatformProtector::new(EphemeralMachineSecret::default());

        let blob = protector.protect(b"key bytes", None).unwrap();
        assert_eq!(protector.unprotect(&blob, None).unwrap().as_slice(), b"key bytes");
    }

    #[test]
    fn test_password_is_required_when_used() {
        let protector = PlatformProtector::new(EphemeralMachineSecret::default());
        let blob = protector.protect(b"key bytes", Some("abc")).unwrap();

        assert!(matches!(
            protector.unprotect(&blob, None),
            Err(RelSignError::DecryptionError(_))
        ));
        assert!(matches!(
            protector.unprotect(&blob, Some("wrong")),
            Err(RelSignError::DecryptionError(_))
        ));
    }

    #[test]
    fn test_other_context_cannot_unprotect() {
        let mine = PlatformProtector::new(EphemeralMachineSecret::default());
        let theirs = PlatformProtector::new(EphemeralMachineSecret::default());
        let blob = mine.protect(b"key bytes", Some("abc")).unwrap();

        // Never initialised a machine secret
        assert!(matches!(
            theirs.unprotect(&blob, Some("abc")),
            Err(RelSignError::DecryptionError(_))
        ));

        // Initialised, but a different one
        theirs.protect(b"other", None).unwrap();
        assert!(matches!(
            theirs.unprotect(&blob, Some("abc")),
            Err(RelSignError::DecryptionError(_))
        ));
    }

    #[test]
    fn test_password_blob_rejected() {
        let protector = PlatformProtector::new(EphemeralMachineSecret::default());
        protector.protect(b"init", None).unwrap();
        let blob = crate::protect::PasswordProtector
            .protect(b"key bytes", Some("abc"))
            .unwrap();

        assert!(matches!(
            protector.unprotect(&blob, Some("abc")),
            Err(RelSignError::DecryptionError(_))
        ));
    }

    #[test]
    fn test_ephemeral_secret_is_stable() {
        let source = EphemeralMachineSecret::default();
        assert!(source.load().unwrap().is_none());

        let first = source.load_or_create().unwrap();
        let second = source.load_or_create().unwrap();
        assert_eq!(*first, *second);
        assert_eq!(*source.load().unwrap().unwrap(), *first);
    }
}
