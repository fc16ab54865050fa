//! Key listing records.

use crate::storage::keystore::CURRENT_KEY_NAME;
use std::path::PathBuf;
use std::time::SystemTime;

/// Information about a stored key for display purposes.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyInfo {
    /// Key name: `current` or the version it was archived under.
    pub name: String,

    /// Location of the protected key file.
    pub path: PathBuf,

    /// Whether this is the active signing key.
    pub is_current: bool,

    /// Last modification time, when the filesystem reports one.
    pub modified: Option<SystemTime>,
}

impl KeyInfo {
    pub fn new(name: String, path: PathBuf, modified: Option<SystemTime>) -> Self {
        Self {
            is_current: name == CURRENT_KEY_NAME,
            name,
            path,
            modified,
        }
    }
}
