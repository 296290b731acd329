//! Error types for token issuing and validation.

use crate::metrics::Reason;
use crate::resolver::ResolveError;
use signet_crypto::CryptoError;
use signet_proto::CodecError;
use thiserror::Error;

/// Boxed error for collaborator failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur while building, signing or parsing a token.
///
/// Several variants share a kind; use [`SignetError::kind`] to branch on the
/// failure class without matching every wrapper variant.
#[derive(Debug, Error)]
pub enum SignetError {
    /// Private key material was rejected by the signing primitive.
    #[error(transparent)]
    InvalidPrivateKey(CryptoError),

    /// Public key material could not be parsed.
    #[error(transparent)]
    InvalidPublicKey(CryptoError),

    /// The key resolver could not produce a key for the token's kid.
    #[error("failed to resolve public key for kid '{key_id}': {source}")]
    KeyResolution {
        key_id: String,
        #[source]
        source: ResolveError,
    },

    /// The signature did not verify against the resolved key.
    #[error("invalid signature: {0}")]
    SignatureVerification(#[source] CryptoError),

    /// The envelope decoded but a required field was absent.
    #[error("token envelope is missing its {0}")]
    MissingEnvelopeField(&'static str),

    /// Wire bytes could not be decoded.
    #[error("malformed token: {0}")]
    Decode(#[source] CodecError),

    /// A claim set or envelope could not be encoded.
    #[error("failed to encode token: {0}")]
    Encode(#[source] CodecError),

    /// `iat` or `exp` is zero or negative.
    #[error("issued_at and expires_at must be positive (iat={issued_at}, exp={expires_at})")]
    NonPositiveTimestamp { issued_at: i64, expires_at: i64 },

    /// `exp` is not after `iat`.
    #[error("expires_at must be greater than issued_at (iat={issued_at}, exp={expires_at})")]
    InvalidExpiryOrder { issued_at: i64, expires_at: i64 },

    /// Token has expired.
    #[error("token expired at {expires_at}")]
    TokenExpired { expires_at: i64 },

    /// Token was issued in the future.
    #[error("token not valid until {issued_at}")]
    TokenNotYetValid { issued_at: i64 },

    /// Token audience differs from the expected one.
    #[error("token audience '{actual}' does not match expected '{expected}'")]
    AudienceMismatch { expected: String, actual: String },

    /// Token lacks a required role.
    #[error("token missing required role: {role}")]
    MissingRequiredRole { role: String },

    /// The token's session id has been revoked.
    #[error("token revoked")]
    TokenRevoked,
}

/// Closed set of failure classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidPrivateKey,
    InvalidPublicKey,
    InvalidSignature,
    InvalidPayload,
    InvalidExpiryOrder,
    TokenExpired,
    TokenNotYetValid,
    AudienceMismatch,
    MissingRequiredRole,
    TokenRevoked,
}

impl ErrorKind {
    /// Reason code reported to metrics sinks for this kind.
    pub fn reason(self) -> Reason {
        match self {
            ErrorKind::InvalidSignature | ErrorKind::InvalidPublicKey => Reason::InvalidSignature,
            ErrorKind::InvalidPayload
            | ErrorKind::InvalidPrivateKey
            | ErrorKind::InvalidExpiryOrder => Reason::InvalidPayload,
            ErrorKind::TokenExpired => Reason::TokenExpired,
            ErrorKind::TokenNotYetValid => Reason::TokenNotYetValid,
            ErrorKind::AudienceMismatch => Reason::AudienceMismatch,
            ErrorKind::MissingRequiredRole => Reason::MissingRequiredRole,
            ErrorKind::TokenRevoked => Reason::TokenRevoked,
        }
    }
}

impl SignetError {
    /// The failure class of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            SignetError::InvalidPrivateKey(_) => ErrorKind::InvalidPrivateKey,
            SignetError::InvalidPublicKey(_) => ErrorKind::InvalidPublicKey,
            // A missing key is reported exactly like a bad signature.
            SignetError::KeyResolution { .. } | SignetError::SignatureVerification(_) => {
                ErrorKind::InvalidSignature
            }
            SignetError::MissingEnvelopeField(_)
            | SignetError::Decode(_)
            | SignetError::Encode(_)
            | SignetError::NonPositiveTimestamp { .. } => ErrorKind::InvalidPayload,
            SignetError::InvalidExpiryOrder { .. } => ErrorKind::InvalidExpiryOrder,
            SignetError::TokenExpired { .. } => ErrorKind::TokenExpired,
            SignetError::TokenNotYetValid { .. } => ErrorKind::TokenNotYetValid,
            SignetError::AudienceMismatch { .. } => ErrorKind::AudienceMismatch,
            SignetError::MissingRequiredRole { .. } => ErrorKind::MissingRequiredRole,
            SignetError::TokenRevoked => ErrorKind::TokenRevoked,
        }
    }

    /// Shorthand for `self.kind().reason()`.
    pub fn reason(&self) -> Reason {
        self.kind().reason()
    }

    /// Check the failure class.
    pub fn is(&self, kind: ErrorKind) -> bool {
        self.kind() == kind
    }
}

impl From<CryptoError> for SignetError {
    fn from(err: CryptoError) -> Self {
        match err {
            CryptoError::InvalidPrivateKey(_) => SignetError::InvalidPrivateKey(err),
            CryptoError::InvalidPublicKey(_) => SignetError::InvalidPublicKey(err),
            _ => SignetError::SignatureVerification(err),
        }
    }
}
