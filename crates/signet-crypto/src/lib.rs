//! # signet-crypto
//!
//! Ed25519 signing primitive used by Signet tokens.
//!
//! This crate provides:
//! - [`sign`] / [`verify`] over raw key bytes, with strict input-size checks
//! - [`KeyPair`] generation, hex import/export and file persistence
//! - [`PublicKey`] for verification-only deployments
//!
//! The functions here are pure: they hold no state and are safe to call
//! concurrently from any number of threads.

pub mod error;
pub mod keys;
pub mod signature;

pub use error::CryptoError;
pub use keys::{KeyPair, PublicKey, load_public_key_file, load_public_key_hex};
pub use signature::{
    KEYPAIR_LENGTH, PUBLIC_KEY_LENGTH, SECRET_KEY_LENGTH, SIGNATURE_LENGTH, sign, verify,
};
