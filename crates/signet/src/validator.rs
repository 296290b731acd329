//! Token verification.
//!
//! [`parse`] runs a fixed, fail-fast pipeline. The payload is decoded before
//! the signature is checked, but only its `kid` is read until verification
//! succeeds.

use crate::claims::Claims;
use crate::context::Context;
use crate::error::SignetError;
use crate::metrics::Reason;
use crate::options::{ValidationConfig, ValidationOption};
use crate::resolver::KeyResolver;
use chrono::Utc;
use signet_proto::{decode_claims, decode_envelope};
use std::collections::HashSet;
use std::sync::Arc;

/// Verify a token and return its claims.
///
/// The configured metrics recorder, if any, is notified exactly once per
/// call with the outcome.
pub fn parse<R, I>(
    ctx: &Context,
    token: &[u8],
    resolver: &R,
    options: I,
) -> Result<Claims, SignetError>
where
    R: KeyResolver + ?Sized,
    I: IntoIterator<Item = ValidationOption>,
{
    let config = ValidationConfig::from_options(options);
    parse_with_config(ctx, token, resolver, &config)
}

fn parse_with_config<R>(
    ctx: &Context,
    token: &[u8],
    resolver: &R,
    config: &ValidationConfig,
) -> Result<Claims, SignetError>
where
    R: KeyResolver + ?Sized,
{
    let result = verify_token(ctx, token, resolver, config);

    let reason = match &result {
        Ok(_) => Reason::Success,
        Err(err) => {
            let reason = err.reason();
            tracing::debug!(
                request_id = ctx.request_id(),
                reason = %reason,
                error = %err,
                "rejected signet token"
            );
            reason
        }
    };

    if let Some(recorder) = config.metrics_recorder() {
        recorder.record(ctx, result.is_ok(), reason);
    }

    result
}

fn verify_token<R>(
    ctx: &Context,
    token: &[u8],
    resolver: &R,
    config: &ValidationConfig,
) -> Result<Claims, SignetError>
where
    R: KeyResolver + ?Sized,
{
    let envelope = decode_envelope(token).map_err(SignetError::Decode)?;
    let payload = envelope
        .payload
        .ok_or(SignetError::MissingEnvelopeField("payload"))?;
    let signature = envelope
        .signature
        .ok_or(SignetError::MissingEnvelopeField("signature"))?;

    // Untrusted until the signature verifies.
    let unverified = decode_claims(&payload).map_err(SignetError::Decode)?;

    let public_key = resolver
        .resolve(ctx, &unverified.key_id)
        .map_err(|source| SignetError::KeyResolution {
            key_id: unverified.key_id.clone(),
            source,
        })?;

    signet_crypto::verify(public_key.as_bytes(), &payload, &signature)
        .map_err(SignetError::SignatureVerification)?;

    let claims = Claims::from(unverified);
    check_claims(&claims, config, Utc::now().timestamp())?;

    tracing::trace!(
        request_id = ctx.request_id(),
        kid = %claims.key_id,
        "verified signet token"
    );
    Ok(claims)
}

/// Checks that run on verified claims, in order.
fn check_claims(claims: &Claims, config: &ValidationConfig, now: i64) -> Result<(), SignetError> {
    if !config.skips_expiration_check() && claims.expires_at <= now {
        return Err(SignetError::TokenExpired {
            expires_at: claims.expires_at,
        });
    }
    if !config.skips_issued_at_check() && claims.issued_at > now {
        return Err(SignetError::TokenNotYetValid {
            issued_at: claims.issued_at,
        });
    }

    if let Some(expected) = config.expected_audience() {
        if claims.audience != expected {
            return Err(SignetError::AudienceMismatch {
                expected: expected.to_string(),
                actual: claims.audience.clone(),
            });
        }
    }

    let required = config.required_roles();
    if !required.is_empty() {
        let granted: HashSet<&str> = claims.roles.iter().map(String::as_str).collect();
        if let Some(missing) = required.iter().find(|role| !granted.contains(role.as_str())) {
            return Err(SignetError::MissingRequiredRole {
                role: missing.clone(),
            });
        }
    }

    if let Some(is_revoked) = config.revocation_check() {
        if claims.is_stateful() && is_revoked(claims.session_id.as_slice()) {
            return Err(SignetError::TokenRevoked);
        }
    }

    Ok(())
}

/// Decode a token's claims without verifying anything.
///
/// For debugging and tooling only. Never base an authorization decision on
/// the result.
pub fn inspect_unverified(token: &[u8]) -> Result<Claims, SignetError> {
    let envelope = decode_envelope(token).map_err(SignetError::Decode)?;
    let payload = envelope
        .payload
        .ok_or(SignetError::MissingEnvelopeField("payload"))?;
    let claims = decode_claims(&payload).map_err(SignetError::Decode)?;
    Ok(Claims::from(claims))
}

/// A resolver bundled with a fixed set of options.
///
/// Cheap to clone and shareable across request handlers.
#[derive(Clone)]
pub struct Validator {
    resolver: Arc<dyn KeyResolver>,
    config: ValidationConfig,
}

impl Validator {
    pub fn new(resolver: impl KeyResolver + 'static) -> Self {
        Self::from_arc(Arc::new(resolver))
    }

    pub fn from_arc(resolver: Arc<dyn KeyResolver>) -> Self {
        Self {
            resolver,
            config: ValidationConfig::default(),
        }
    }

    pub fn with_option(mut self, option: ValidationOption) -> Self {
        self.config.apply(option);
        self
    }

    pub fn with_options(mut self, options: impl IntoIterator<Item = ValidationOption>) -> Self {
        for option in options {
            self.config.apply(option);
        }
        self
    }

    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    pub fn resolver(&self) -> &Arc<dyn KeyResolver> {
        &self.resolver
    }

    /// Verify `token` with this validator's resolver and options.
    pub fn parse(&self, ctx: &Context, token: &[u8]) -> Result<Claims, SignetError> {
        parse_with_config(ctx, token, self.resolver.as_ref(), &self.config)
    }
}

impl std::fmt::Debug for Validator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Validator")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
