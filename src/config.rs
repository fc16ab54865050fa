//! Runtime configuration.
//!
//! Nothing in the library reads ambient state: the key directory and the
//! protector backend are carried in [`Settings`] and handed to the keystore
//! and protector constructors explicitly.

use crate::error::Result;
use crate::protect::{protector_for, ProtectorBackend, SecretProtector};
use crate::storage::keystore::KeyStore;
use std::path::PathBuf;

/// Application directory name under the user's data directory.
pub const APP_DIR_NAME: &str = "relsign";

/// Resolved settings for one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Directory holding protected private keys.
    pub key_dir: PathBuf,
    /// Backend protecting private keys at rest.
    pub backend: ProtectorBackend,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            key_dir: default_key_dir(),
            backend: ProtectorBackend::platform_default(),
        }
    }
}

impl Settings {
    /// Apply explicit overrides on top of the defaults.
    pub fn resolve(key_dir: Option<PathBuf>, backend: Option<ProtectorBackend>) -> Self {
        let defaults = Self::default();
        Self {
            key_dir: key_dir.unwrap_or(defaults.key_dir),
            backend: backend.unwrap_or(defaults.backend),
        }
    }

    pub fn keystore(&self) -> KeyStore {
        KeyStore::new(&self.key_dir)
    }

    pub fn protector(&self) -> Result<Box<dyn SecretProtector>> {
        protector_for(self.backend)
    }
}

/// `<data_dir>/relsign/keys`, or `./.relsign/keys` when the platform has no
/// data directory.
pub fn default_key_dir() -> PathBuf {
    match dirs::data_dir() {
        Some(data_dir) => data_dir.join(APP_DIR_NAME).join("keys"),
        None => PathBuf::from(format!(".{}", APP_DIR_NAME)).join("keys"),
    }
}
