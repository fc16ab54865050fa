//! relsign: release signing with rotating Ed25519 keys
//!
//! This library signs software release payloads and verifies them. It can:
//!
//! - Generate Ed25519 release keypairs and archive the previous key under the
//!   version it signed
//! - Store private keys protected at rest, bound to the OS keyring and/or a password
//! - Sign the SHA-256 digest of a payload and package payload and signature
//!   into a single release archive
//! - Verify release archives against a distributed public key
//!
//! # Architecture
//!
//! Every operation is a short synchronous sequence of file-system calls and
//! in-memory cryptography. All operations return [`Result`]; "nothing to do"
//! is an `Ok(None)`, never an error.
//!
//! # Example
//!
//! ```rust,no_run
//! use relsign::protect::PasswordProtector;
//! use relsign::release::{generate_release_keys, sign_release, verify_release, RotationPolicy};
//! use relsign::storage::keystore::{KeyStore, CURRENT_KEY_NAME};
//! use std::path::Path;
//!
//! fn example() -> relsign::Result<()> {
//!     let store = KeyStore::new("/tmp/relsign/keys");
//!     let policy = RotationPolicy::MoveOld("1.0.0".to_string());
//!     generate_release_keys(&store, &PasswordProtector, Some("pw"), &policy, Path::new("release.pub"))?;
//!
//!     sign_release(
//!         &store,
//!         &PasswordProtector,
//!         Some("pw"),
//!         Path::new("app.zip"),
//!         Path::new("app.release"),
//!         CURRENT_KEY_NAME,
//!     )?;
//!     assert!(verify_release(Path::new("app.release"), Path::new("release.pub"))?);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod crypto;
pub mod error;
pub mod protect;
pub mod release;
pub mod storage;

// Re-export commonly used types
pub use error::{RelSignError, Result};
