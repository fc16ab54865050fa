//! Key storage module.
//!
//! Protected private keys are stored one file per name, with `current` as the
//! active signing key and archived keys named after the release they signed.

pub mod keystore;
pub mod metadata;
