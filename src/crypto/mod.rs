//! Cryptographic primitives.
//!
//! - Ed25519 key generation and import
//! - SHA-256 payload digests
//! - Argon2 key derivation and AES-GCM sealed blobs used by the secret protectors
//!
//! # Example
//!
//! ```rust
//! use relsign::crypto::ed25519::generate_keypair;
//! use relsign::crypto::encryption::{open_secret, seal_secret};
//!
//! # fn example() -> relsign::error::Result<()> {
//! let keypair = generate_keypair();
//!
//! let sealed = seal_secret(&keypair.secret_bytes(), b"secure-password", 1)?;
//! let opened = open_secret(&sealed, b"secure-password", 1)?;
//! assert_eq!(keypair.secret_bytes().as_slice(), opened.as_slice());
//! # Ok(())
//! # }
//! ```

pub mod digest;
pub mod ed25519;
pub mod encryption;
pub mod password;
