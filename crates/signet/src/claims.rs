//! The claim set carried by a Signet token.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use signet_proto::ClaimSet;
use std::collections::BTreeMap;

/// Claims contained in a Signet token.
///
/// Values returned by [`crate::parse`] have passed signature verification
/// and every configured check; values from [`crate::inspect_unverified`]
/// have not.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Claims {
    /// Principal the token was issued to (e.g., a user id).
    #[serde(default)]
    pub subject: String,

    /// Service the token is intended for.
    #[serde(default)]
    pub audience: String,

    /// Granted roles, in issue order. Duplicates are kept.
    #[serde(default)]
    pub roles: Vec<String>,

    /// Extension claims.
    #[serde(default)]
    pub custom_claims: BTreeMap<String, String>,

    /// Session id of a stateful token; empty for stateless tokens.
    #[serde(default, with = "hex::serde", skip_serializing_if = "Vec::is_empty")]
    pub session_id: Vec<u8>,

    /// Issued-at, Unix seconds.
    pub issued_at: i64,

    /// Expiry, Unix seconds.
    pub expires_at: i64,

    /// Id of the signing key; empty selects the default key.
    #[serde(default)]
    pub key_id: String,
}

impl Claims {
    /// Whether the token carries a session id and is subject to revocation.
    pub fn is_stateful(&self) -> bool {
        !self.session_id.is_empty()
    }

    /// Check if a role was granted.
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    /// Look up a custom claim.
    pub fn custom_claim(&self, key: &str) -> Option<&str> {
        self.custom_claims.get(key).map(String::as_str)
    }

    pub fn issued_at_utc(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.issued_at, 0)
    }

    pub fn expires_at_utc(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.expires_at, 0)
    }

    /// Get time until expiration, negative once expired.
    ///
    /// `None` when the distance does not fit a `chrono::Duration`.
    pub fn time_until_expiration(&self) -> Option<chrono::Duration> {
        self.expires_at
            .checked_sub(Utc::now().timestamp())
            .and_then(chrono::Duration::try_seconds)
    }
}

impl From<ClaimSet> for Claims {
    fn from(wire: ClaimSet) -> Self {
        Self {
            subject: wire.subject,
            audience: wire.audience,
            roles: wire.roles,
            custom_claims: wire.custom_claims,
            session_id: wire.session_id,
            issued_at: wire.issued_at,
            expires_at: wire.expires_at,
            key_id: wire.key_id,
        }
    }
}

impl From<&Claims> for ClaimSet {
    fn from(claims: &Claims) -> Self {
        Self {
            subject: claims.subject.clone(),
            audience: claims.audience.clone(),
            roles: claims.roles.clone(),
            custom_claims: claims.custom_claims.clone(),
            session_id: claims.session_id.clone(),
            issued_at: claims.issued_at,
            expires_at: claims.expires_at,
            key_id: claims.key_id.clone(),
        }
    }
}
