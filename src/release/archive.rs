//! Signed release archives.
//!
//! A release archive is a zip file with two entries: the payload
//! (`payload.zip`) and its detached Ed25519 signature (`signature.sig`).
//! Writing an archive never overwrites an existing file; the old file is
//! rotated to `<output>.backup` or the first free `<output>.backup-N`.

use crate::error::{RelSignError, Result};
use std::ffi::OsString;
use std::fs;
use std::io::{self, Cursor, Read, Seek, Write};
use std::path::{Component, Path, PathBuf};
use tempfile::NamedTempFile;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipArchive, ZipWriter};

/// Archive entry holding the signed payload.
pub const PAYLOAD_ENTRY: &str = "payload.zip";

/// Archive entry holding the signature.
pub const SIGNATURE_ENTRY: &str = "signature.sig";

/// The two logical entries of a release archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseArchive {
    pub payload: Vec<u8>,
    pub signature: Vec<u8>,
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name: OsString = path.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

/// The name a pre-existing `output` would be rotated to.
///
/// `<output>.backup` if free, otherwise `<output>.backup-N` for the smallest
/// `N >= 1` that does not exist yet.
pub fn backup_path_for(output: &Path) -> PathBuf {
    let first = with_suffix(output, ".backup");
    if !first.exists() {
        return first;
    }

    (1u64..)
        .map(|i| with_suffix(output, &format!(".backup-{}", i)))
        .find(|candidate| !candidate.exists())
        .unwrap_or(first)
}

/// Move an existing `output` out of the way.
///
/// Returns where the file went, or `None` if there was nothing at `output`.
pub fn rotate_existing(output: &Path) -> Result<Option<PathBuf>> {
    if !output.exists() {
        return Ok(None);
    }

    let backup = backup_path_for(output);
    fs::rename(output, &backup)?;
    tracing::info!(
        from = %output.display(),
        to = %backup.display(),
        "rotated existing output"
    );
    Ok(Some(backup))
}

// Fixed timestamp and mode so identical inputs encode to identical bytes.
fn entry_options() -> SimpleFileOptions {
    SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(DateTime::default())
        .unix_permissions(0o644)
}

fn append_entry<W: Write + Seek>(writer: &mut ZipWriter<W>, name: &str, data: &[u8]) -> Result<()> {
    writer
        .start_file(name, entry_options())
        .map_err(io::Error::from)?;
    writer.write_all(data)?;
    Ok(())
}

/// Encode a release archive in memory.
pub fn encode_archive(payload: &[u8], signature: &[u8]) -> Result<Vec<u8>> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));

    append_entry(&mut writer, PAYLOAD_ENTRY, payload)?;
    append_entry(&mut writer, SIGNATURE_ENTRY, signature)?;

    let cursor = writer.finish().map_err(io::Error::from)?;
    Ok(cursor.into_inner())
}

/// Write `payload` and `signature` as a release archive at `output`.
///
/// The archive is staged next to `output` first. Only once it is complete is
/// any existing file rotated to a backup and the staged archive renamed into
/// place. Returns the backup path, if a rotation happened.
pub fn build_archive(payload: &[u8], signature: &[u8], output: &Path) -> Result<Option<PathBuf>> {
    let encoded = encode_archive(payload, signature)?;

    let parent = match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&parent)?;

    let mut staged = NamedTempFile::new_in(&parent)?;
    staged.write_all(&encoded)?;
    staged.as_file().sync_all()?;

    let backup = rotate_existing(output)?;
    if let Err(e) = staged.persist(output) {
        if let Some(backup) = &backup {
            if let Err(restore) = fs::rename(backup, output) {
                tracing::warn!(
                    backup = %backup.display(),
                    error = %restore,
                    "could not restore previous output"
                );
            }
        }
        return Err(e.error.into());
    }

    tracing::debug!(
        output = %output.display(),
        bytes = encoded.len(),
        "wrote release archive"
    );
    Ok(backup)
}

fn malformed(path: &Path, detail: impl std::fmt::Display) -> RelSignError {
    RelSignError::MalformedArchiveError(format!("{}: {}", path.display(), detail))
}

// Zip tools may store entries as `./payload.zip`.
fn normalized_entry_name(name: &str) -> PathBuf {
    Path::new(name)
        .components()
        .filter(|component| !matches!(component, Component::CurDir))
        .collect()
}

/// Read the payload and signature entries of the archive at `archive_path`.
///
/// A file that is not a readable archive, or that lacks either entry or
/// carries one of them twice, is a [`RelSignError::MalformedArchiveError`].
pub fn unpack_archive(archive_path: &Path) -> Result<ReleaseArchive> {
    let data = fs::read(archive_path)?;
    let mut archive = ZipArchive::new(Cursor::new(data))
        .map_err(|e| malformed(archive_path, format!("failed to read entries: {}", e)))?;

    let mut payload = None;
    let mut signature = None;

    for index in 0..archive.len() {
        let mut entry = archive
            .by_index(index)
            .map_err(|e| malformed(archive_path, format!("failed to read entry: {}", e)))?;
        if entry.is_dir() {
            continue;
        }
        let entry_path = normalized_entry_name(entry.name());

        let slot = if entry_path == Path::new(PAYLOAD_ENTRY) {
            &mut payload
        } else if entry_path == Path::new(SIGNATURE_ENTRY) {
            &mut signature
        } else {
            tracing::debug!(entry = %entry_path.display(), "ignoring unknown archive entry");
            continue;
        };

        if slot.is_some() {
            return Err(malformed(
                archive_path,
                format!("duplicate entry {}", entry_path.display()),
            ));
        }

        let mut contents = Vec::new();
        entry
            .read_to_end(&mut contents)
            .map_err(|e| malformed(archive_path, format!("failed to read entry: {}", e)))?;
        *slot = Some(contents);
    }

    match (payload, signature) {
        (Some(payload), Some(signature)) => Ok(ReleaseArchive { payload, signature }),
        (None, _) => Err(malformed(
            archive_path,
            format!("missing {}; this archive was not produced by relsign", PAYLOAD_ENTRY),
        )),
        (_, None) => Err(malformed(
            archive_path,
            format!("missing {}; this archive was not produced by relsign", SIGNATURE_ENTRY),
        )),
    }
}
