//! Error types for the relsign library.
//!
//! Every fallible operation in the crate returns [`Result`]. Variants carry a
//! human-readable context string so the CLI can print them as-is.

use thiserror::Error;

/// The main error type for relsign operations.
#[derive(Error, Debug)]
pub enum RelSignError {
    /// The archive target name for the current key is already taken
    #[error("File conflict: {0}")]
    FileConflictError(String),

    /// No `current` key or requested archived key exists
    #[error("Missing key: {0}")]
    MissingKeyError(String),

    /// Wrong password, corrupted blob, or foreign machine context
    #[error("Decryption failed: {0}")]
    DecryptionError(String),

    /// Release archive lacks its payload or signature entry
    #[error("Malformed archive: {0}")]
    MalformedArchiveError(String),

    /// Key or signature bytes of the wrong length or shape
    #[error("Malformed input: {0}")]
    MalformedInputError(String),

    /// Storage I/O error
    #[error("Storage I/O error: {0}")]
    StorageError(#[from] std::io::Error),

    /// Key derivation failed
    #[error("Key derivation error: {0}")]
    KeyDerivationError(String),

    /// Encryption failed
    #[error("Encryption error: {0}")]
    EncryptionError(String),

    /// Invalid private key material
    #[error("Invalid key: {0}")]
    InvalidKeyError(String),

    /// Key name cannot be mapped to a file in the key directory
    #[error("Invalid key name: {0}")]
    InvalidKeyNameError(String),

    /// Generation was requested without deciding what happens to the current key
    #[error("{0}")]
    RotationPolicyError(String),

    /// The selected secret protector backend is not available on this platform
    #[error("Unsupported protector backend: {0}")]
    UnsupportedBackendError(String),

    /// OS keyring access failed
    #[error("Keyring error: {0}")]
    KeyringError(String),
}

/// A specialized Result type for relsign operations.
pub type Result<T> = std::result::Result<T, RelSignError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = RelSignError::FileConflictError("1.0.0 already archived".to_string());
        assert_eq!(err.to_string(), "File conflict: 1.0.0 already archived");
    }

    #[test]
    fn test_rotation_policy_error_is_bare_message() {
        let err = RelSignError::RotationPolicyError("pick one".to_string());
        assert_eq!(err.to_string(), "pick one");
    }

    #[test]
    fn test_io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: RelSignError = io.into();
        assert!(matches!(err, RelSignError::StorageError(_)));
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<RelSignError>();
    }
}
