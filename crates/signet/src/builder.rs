//! Fluent construction and signing of claim sets.

use crate::claims::Claims;
use crate::error::SignetError;
use chrono::Utc;
use signet_proto::{ClaimSet, TokenEnvelope, encode_claims, encode_envelope};

/// Lifetime given to tokens that do not set an explicit expiration.
pub const DEFAULT_TOKEN_LIFETIME_SECS: i64 = 15 * 60;

/// Builder for Signet tokens.
///
/// Starts from `iat = now` and `exp = now + 15 minutes`. Setters overwrite
/// without validating; [`PayloadBuilder::build`] checks the timestamps.
///
/// Building and signing borrow the builder, so it can be reused. Each signed
/// token freezes the claims as they were at signing time.
#[derive(Debug, Clone)]
pub struct PayloadBuilder {
    claims: Claims,
}

impl PayloadBuilder {
    /// Create a builder with secure defaults.
    pub fn new() -> Self {
        let now = Utc::now().timestamp();
        Self {
            claims: Claims {
                issued_at: now,
                expires_at: now + DEFAULT_TOKEN_LIFETIME_SECS,
                ..Default::default()
            },
        }
    }

    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.claims.subject = subject.into();
        self
    }

    pub fn with_audience(mut self, audience: impl Into<String>) -> Self {
        self.claims.audience = audience.into();
        self
    }

    /// Set the signing key id used by verifiers to pick a public key.
    pub fn with_key_id(mut self, key_id: impl Into<String>) -> Self {
        self.claims.key_id = key_id.into();
        self
    }

    /// Make the token stateful by attaching a session id.
    pub fn with_session_id(mut self, session_id: impl Into<Vec<u8>>) -> Self {
        self.claims.session_id = session_id.into();
        self
    }

    pub fn with_issued_at(mut self, issued_at: i64) -> Self {
        self.claims.issued_at = issued_at;
        self
    }

    pub fn with_expiration(mut self, expires_at: i64) -> Self {
        self.claims.expires_at = expires_at;
        self
    }

    /// Set `exp` relative to the current `iat`. Saturates at the `i64` range;
    /// [`PayloadBuilder::build`] rejects a result that breaks the invariant.
    pub fn with_lifetime(mut self, lifetime: chrono::Duration) -> Self {
        self.claims.expires_at = self
            .claims
            .issued_at
            .saturating_add(lifetime.num_seconds());
        self
    }

    /// Append a role. Duplicates are kept.
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.claims.roles.push(role.into());
        self
    }

    /// Insert a custom claim, replacing any previous value for the key.
    pub fn with_custom_claim(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.claims.custom_claims.insert(key.into(), value.into());
        self
    }

    /// Validate the timestamps and return the claim set.
    pub fn build(&self) -> Result<Claims, SignetError> {
        let Claims {
            issued_at,
            expires_at,
            ..
        } = self.claims;

        if issued_at <= 0 || expires_at <= 0 {
            return Err(SignetError::NonPositiveTimestamp {
                issued_at,
                expires_at,
            });
        }
        if expires_at <= issued_at {
            return Err(SignetError::InvalidExpiryOrder {
                issued_at,
                expires_at,
            });
        }

        Ok(self.claims.clone())
    }

    /// Build, encode and sign the claims, returning the wire bytes.
    ///
    /// `private_key` is a 32-byte Ed25519 seed or a 64-byte keypair.
    pub fn sign(&self, private_key: impl AsRef<[u8]>) -> Result<Vec<u8>, SignetError> {
        let claims = self.build()?;

        let payload = encode_claims(&ClaimSet::from(&claims)).map_err(SignetError::Encode)?;
        let signature =
            signet_crypto::sign(private_key.as_ref(), &payload).map_err(SignetError::from)?;

        let token = encode_envelope(&TokenEnvelope::new(payload, signature))
            .map_err(SignetError::Encode)?;

        tracing::trace!(
            kid = %claims.key_id,
            exp = claims.expires_at,
            size = token.len(),
            "signed signet token"
        );

        Ok(token)
    }
}

impl Default for PayloadBuilder {
    fn default() -> Self {
        Self::new()
    }
}
