//! # signet
//!
//! Compact, signed identity tokens for service-to-service calls.
//!
//! A Signet token is a binary-encoded claim set signed with Ed25519. It plays
//! the same role as a JWT but skips JSON and base64: the claims are encoded
//! with a fixed field-tagged schema and the signature covers those bytes
//! verbatim.
//!
//! This crate provides:
//! - [`PayloadBuilder`] for minting tokens with secure defaults
//! - [`parse`] and [`Validator`] for verifying tokens on each request
//! - [`KeyResolver`] for key rotation and multi-issuer setups
//! - [`ValidationOption`] for optional audience, role and revocation checks
//! - [`MetricsRecorder`] for reporting one outcome per validation attempt
//!
//! ## Validation order
//!
//! | Step | Check | Failure kind |
//! |------|-------|--------------|
//! | 1 | Decode envelope, both fields present | `InvalidPayload` |
//! | 2 | Decode claims (only `kid` is read) | `InvalidPayload` |
//! | 3 | Resolve the public key for `kid` | `InvalidSignature` |
//! | 4 | Verify the Ed25519 signature | `InvalidSignature` |
//! | 5 | `exp` / `iat` against the current time | `TokenExpired` / `TokenNotYetValid` |
//! | 6 | Expected audience | `AudienceMismatch` |
//! | 7 | Required roles | `MissingRequiredRole` |
//! | 8 | Revocation of stateful tokens | `TokenRevoked` |
//!
//! ```rust,ignore
//! use signet::{Context, KeyPair, PayloadBuilder, StaticKeyResolver, ValidationOption, parse};
//!
//! let keypair = KeyPair::generate();
//! let token = PayloadBuilder::new()
//!     .with_subject("user-123")
//!     .with_audience("api-backend")
//!     .with_role("admin")
//!     .sign(keypair.private_key_bytes())?;
//!
//! let resolver = StaticKeyResolver::new(keypair.public_key());
//! let claims = parse(
//!     &Context::new(),
//!     &token,
//!     &resolver,
//!     [
//!         ValidationOption::expected_audience("api-backend"),
//!         ValidationOption::require_role("admin"),
//!     ],
//! )?;
//! assert_eq!(claims.subject, "user-123");
//! ```

pub mod builder;
pub mod claims;
pub mod context;
pub mod error;
pub mod metrics;
pub mod options;
pub mod resolver;
pub mod validator;

pub use builder::{DEFAULT_TOKEN_LIFETIME_SECS, PayloadBuilder};
pub use claims::Claims;
pub use context::Context;
pub use error::{BoxError, ErrorKind, SignetError};
pub use metrics::{
    FnRecorder, MetricsRecorder, Reason, TracingRecorder, ValidationCounters, recorder_fn,
};
pub use options::{RevocationCheck, ValidationConfig, ValidationOption};
pub use resolver::{
    CachingKeyResolver, FnKeyResolver, KeyResolver, KeyRing, ResolveError, StaticKeyResolver,
    key_resolver_fn,
};
pub use signet_crypto::{KeyPair, PublicKey};
pub use validator::{Validator, inspect_unverified, parse};
