//! Release workflows: key generation and rotation, signing, verification and
//! archive packaging.

pub mod archive;
pub mod keys;
pub mod signer;
pub mod verifier;

pub use archive::{build_archive, unpack_archive, ReleaseArchive};
pub use keys::{generate_release_keys, GeneratedKeys, RotationPolicy};
pub use signer::{sign_payload, sign_release, SignedRelease};
pub use verifier::{verify_payload, verify_release};
