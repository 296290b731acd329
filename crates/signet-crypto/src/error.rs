//! Error types for the signing primitive.

use thiserror::Error;

/// Errors that can occur while signing, verifying or loading keys.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// Private key material is malformed (wrong length or inconsistent halves).
    #[error("invalid private key: {0}")]
    InvalidPrivateKey(String),

    /// Public key material is malformed (wrong length or not a curve point).
    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),

    /// Signature bytes are malformed.
    #[error("invalid signature: {0}")]
    InvalidSignature(String),

    /// The signature does not match the data under the given public key.
    #[error("signature verification failed")]
    VerificationFailed,

    /// IO error (reading/writing keys).
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}
