//! Release key generation and rotation.
//!
//! Generating a new release key retires the current one first. The caller
//! must say what happens to it: archive it under the version it signed, or
//! knowingly discard it.

use crate::crypto::ed25519::{generate_keypair, PUBLIC_KEY_LENGTH};
use crate::error::{RelSignError, Result};
use crate::protect::SecretProtector;
use crate::storage::keystore::{KeyStore, CURRENT_KEY_NAME};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// What to do with the existing `current` key when generating a new one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RotationPolicy {
    /// Archive the current key under this version name.
    MoveOld(String),
    /// Overwrite the current key. It is lost for good.
    IgnoreMoveOld,
}

impl RotationPolicy {
    /// Build a policy from the `--move-old` / `--ignore-move-old` flags.
    ///
    /// Fails when neither flag is given, so that a new key is never generated
    /// without a decision about the old one.
    pub fn from_flags(move_old: Option<String>, ignore_move_old: bool) -> Result<Self> {
        match (move_old, ignore_move_old) {
            (Some(version), _) => Ok(RotationPolicy::MoveOld(version)),
            (None, true) => Ok(RotationPolicy::IgnoreMoveOld),
            (None, false) => Err(RelSignError::RotationPolicyError(
                "Generating a new key without archiving the current one loses the private key \
                 of the previous release. Pass --move-old <VERSION> to archive it, or \
                 --ignore-move-old to discard it."
                    .to_string(),
            )),
        }
    }

    fn archive_target(&self) -> &str {
        match self {
            RotationPolicy::MoveOld(version) => version,
            RotationPolicy::IgnoreMoveOld => "",
        }
    }
}

/// Outcome of [`generate_release_keys`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedKeys {
    /// Name the previous `current` key was archived under, if one was moved.
    pub archived_as: Option<String>,
    /// The new public key, as written to the public key file.
    pub public_key: [u8; PUBLIC_KEY_LENGTH],
}

/// Generate a new release keypair and make it `current`.
///
/// The private key is protected and the public key staged next to its
/// destination before anything in the keystore changes. The old `current`
/// key is archived (or the conflict reported) before the new one is written.
/// If a later step fails, the keystore is put back the way it was.
pub fn generate_release_keys(
    store: &KeyStore,
    protector: &dyn SecretProtector,
    password: Option<&str>,
    policy: &RotationPolicy,
    public_key_path: &Path,
) -> Result<GeneratedKeys> {
    let keypair = generate_keypair();
    let blob = protector.protect(&keypair.secret_bytes(), password)?;
    let public_key = keypair.public_bytes();
    drop(keypair);

    let staged_public_key = stage_public_key(&public_key, public_key_path)?;
    let previous = match store.read(CURRENT_KEY_NAME) {
        Ok(blob) => Some(blob),
        Err(RelSignError::MissingKeyError(_)) => None,
        Err(e) => return Err(e),
    };

    let archived_as = store.archive_current(policy.archive_target())?;
    let installed = store.write_current(&blob).and_then(|()| {
        staged_public_key
            .persist(public_key_path)
            .map(|_| ())
            .map_err(|e| e.error.into())
    });
    if let Err(e) = installed {
        if let Err(rollback) = roll_back(store, archived_as.as_deref(), previous.as_deref()) {
            tracing::warn!(error = %rollback, "could not restore the previous current key");
        }
        return Err(e);
    }

    tracing::info!(
        archived_as = archived_as.as_deref().unwrap_or(""),
        public_key = %hex::encode(public_key),
        "generated release keys"
    );
    Ok(GeneratedKeys {
        archived_as,
        public_key,
    })
}

fn stage_public_key(public_key: &[u8], path: &Path) -> Result<NamedTempFile> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&parent)?;

    let mut staged = NamedTempFile::new_in(&parent)?;
    staged.write_all(public_key)?;
    staged.as_file().sync_all()?;
    Ok(staged)
}

fn roll_back(store: &KeyStore, archived_as: Option<&str>, previous: Option<&[u8]>) -> Result<()> {
    match (archived_as, previous) {
        (Some(name), _) => store.restore_archived(name),
        (None, Some(blob)) => store.write_current(blob),
        (None, None) => store.remove(CURRENT_KEY_NAME),
    }
}
