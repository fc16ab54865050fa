//! File-per-name store for protected release keys.
//!
//! Each key lives in `<root>/<name>.bin`. The reserved name `current` is the
//! active signing key; every other name is a retired key archived under the
//! version it signed.

use crate::error::{RelSignError, Result};
use crate::storage::metadata::KeyInfo;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Name of the active signing key.
pub const CURRENT_KEY_NAME: &str = "current";

/// Extension of protected key files.
pub const KEY_FILE_EXTENSION: &str = "bin";

/// A directory of protected private keys.
#[derive(Debug, Clone)]
pub struct KeyStore {
    root: PathBuf,
}

impl KeyStore {
    /// Create a keystore rooted at `root`. Nothing is touched on disk until a
    /// key is written.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The key-storage directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a key name to its file path.
    ///
    /// # Example
    ///
    /// ```
    /// use relsign::storage::keystore::KeyStore;
    /// use std::path::Path;
    ///
    /// let store = KeyStore::new("/keys");
    /// assert_eq!(store.resolve_path("1.0.0").unwrap(), Path::new("/keys/1.0.0.bin"));
    /// ```
    pub fn resolve_path(&self, name: &str) -> Result<PathBuf> {
        validate_name(name)?;
        Ok(self
            .root
            .join(format!("{}.{}", name, KEY_FILE_EXTENSION)))
    }

    /// Whether a key with this name is stored.
    pub fn exists(&self, name: &str) -> Result<bool> {
        Ok(self.resolve_path(name)?.is_file())
    }

    /// Retire the `current` key under `target_name`.
    ///
    /// Returns `None` when there was nothing to do: `target_name` is empty or
    /// no `current` key exists. An occupied target is a conflict and leaves
    /// every file untouched.
    pub fn archive_current(&self, target_name: &str) -> Result<Option<String>> {
        if target_name.is_empty() {
            return Ok(None);
        }

        let target = self.resolve_path(target_name)?;
        if target.exists() {
            return Err(RelSignError::FileConflictError(format!(
                "a private key for version '{}' already exists at {}",
                target_name,
                target.display()
            )));
        }

        let current = self.resolve_path(CURRENT_KEY_NAME)?;
        if !current.is_file() {
            tracing::debug!(version = target_name, "no current key to archive");
            return Ok(None);
        }

        fs::rename(&current, &target)?;
        tracing::info!(
            from = %current.display(),
            to = %target.display(),
            "archived current key"
        );
        Ok(Some(target_name.to_string()))
    }

    /// Replace the `current` key with `blob`.
    ///
    /// The blob is written to a temporary file in the key directory and then
    /// renamed over `current`, so a failed write never leaves a truncated key.
    pub fn write_current(&self, blob: &[u8]) -> Result<()> {
        let path = self.resolve_path(CURRENT_KEY_NAME)?;
        fs::create_dir_all(&self.root)?;

        let mut staged = NamedTempFile::new_in(&self.root)?;
        staged.write_all(blob)?;
        staged.as_file().sync_all()?;
        staged.persist(&path).map_err(|e| e.error)?;

        tracing::info!(path = %path.display(), "wrote current key");
        Ok(())
    }

    /// Move the key archived as `name` back to `current`, replacing whatever
    /// `current` holds now.
    pub fn restore_archived(&self, name: &str) -> Result<()> {
        let archived = self.resolve_path(name)?;
        let current = self.resolve_path(CURRENT_KEY_NAME)?;
        fs::rename(&archived, &current)?;
        tracing::info!(from = %archived.display(), "restored archived key as current");
        Ok(())
    }

    /// Delete the key stored under `name`. A missing key is not an error.
    pub fn remove(&self, name: &str) -> Result<()> {
        match fs::remove_file(self.resolve_path(name)?) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Load the protected blob stored under `name`.
    pub fn read(&self, name: &str) -> Result<Vec<u8>> {
        let path = self.resolve_path(name)?;
        match fs::read(&path) {
            Ok(blob) => Ok(blob),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(RelSignError::MissingKeyError(format!(
                    "no private key named '{}' at {}",
                    name,
                    path.display()
                )))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// List stored keys, `current` first and archived keys by name.
    pub fn list(&self) -> Result<Vec<KeyInfo>> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut keys = Vec::new();
        for entry in entries {
            let entry = entry?;
            let path = entry.path();
            if !path.is_file()
                || path.extension().and_then(|ext| ext.to_str()) != Some(KEY_FILE_EXTENSION)
            {
                continue;
            }
            let Some(name) = path.file_stem().and_then(|stem| stem.to_str()) else {
                continue;
            };
            let modified = entry.metadata()?.modified().ok();
            keys.push(KeyInfo::new(name.to_string(), path.clone(), modified));
        }

        keys.sort_by(|a, b| {
            b.is_current
                .cmp(&a.is_current)
                .then_with(|| a.name.cmp(&b.name))
        });
        Ok(keys)
    }
}

fn validate_name(name: &str) -> Result<()> {
    let invalid = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\'])
        || name.contains('\0');
    if invalid {
        return Err(RelSignError::InvalidKeyNameError(format!(
            "'{}' cannot be used as a key file name",
            name
        )));
    }
    Ok(())
}
