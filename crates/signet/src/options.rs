//! Optional checks applied by the validator.
//!
//! Options are plain values folded into a [`ValidationConfig`] in the order
//! given. Role requirements accumulate; the audience, revocation predicate
//! and metrics recorder keep the last value set. Nothing can be unset.

use crate::metrics::MetricsRecorder;
use std::fmt;
use std::sync::Arc;

/// Predicate answering "is this session id revoked?".
pub type RevocationCheck = Arc<dyn Fn(&[u8]) -> bool + Send + Sync>;

/// A single validation option.
#[derive(Clone)]
pub enum ValidationOption {
    /// Accept tokens whose `exp` is in the past.
    SkipExpirationCheck,
    /// Accept tokens whose `iat` is in the future.
    SkipIssuedAtCheck,
    /// Require `aud` to equal this value. Empty disables the check.
    ExpectedAudience(String),
    /// Require one role.
    RequireRole(String),
    /// Require several roles.
    RequireRoles(Vec<String>),
    /// Reject stateful tokens whose session id the predicate reports revoked.
    RevocationCheck(RevocationCheck),
    /// Report each outcome to this recorder.
    MetricsRecorder(Arc<dyn MetricsRecorder>),
}

impl ValidationOption {
    pub fn skip_expiration_check() -> Self {
        ValidationOption::SkipExpirationCheck
    }

    pub fn skip_issued_at_check() -> Self {
        ValidationOption::SkipIssuedAtCheck
    }

    pub fn expected_audience(audience: impl Into<String>) -> Self {
        ValidationOption::ExpectedAudience(audience.into())
    }

    pub fn require_role(role: impl Into<String>) -> Self {
        ValidationOption::RequireRole(role.into())
    }

    pub fn require_roles<I, S>(roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ValidationOption::RequireRoles(roles.into_iter().map(Into::into).collect())
    }

    pub fn revocation_check<F>(is_revoked: F) -> Self
    where
        F: Fn(&[u8]) -> bool + Send + Sync + 'static,
    {
        ValidationOption::RevocationCheck(Arc::new(is_revoked))
    }

    pub fn metrics_recorder(recorder: Arc<dyn MetricsRecorder>) -> Self {
        ValidationOption::MetricsRecorder(recorder)
    }
}

impl fmt::Debug for ValidationOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationOption::SkipExpirationCheck => f.write_str("SkipExpirationCheck"),
            ValidationOption::SkipIssuedAtCheck => f.write_str("SkipIssuedAtCheck"),
            ValidationOption::ExpectedAudience(aud) => {
                f.debug_tuple("ExpectedAudience").field(aud).finish()
            }
            ValidationOption::RequireRole(role) => {
                f.debug_tuple("RequireRole").field(role).finish()
            }
            ValidationOption::RequireRoles(roles) => {
                f.debug_tuple("RequireRoles").field(roles).finish()
            }
            ValidationOption::RevocationCheck(_) => f.write_str("RevocationCheck(..)"),
            ValidationOption::MetricsRecorder(_) => f.write_str("MetricsRecorder(..)"),
        }
    }
}

/// Accumulated validation settings.
#[derive(Clone, Default)]
pub struct ValidationConfig {
    skip_expiration_check: bool,
    skip_issued_at_check: bool,
    expected_audience: String,
    required_roles: Vec<String>,
    revocation_check: Option<RevocationCheck>,
    metrics_recorder: Option<Arc<dyn MetricsRecorder>>,
}

impl ValidationConfig {
    /// Fold options into a configuration, in order.
    pub fn from_options<I>(options: I) -> Self
    where
        I: IntoIterator<Item = ValidationOption>,
    {
        let mut config = Self::default();
        for option in options {
            config.apply(option);
        }
        config
    }

    /// Apply one option.
    pub fn apply(&mut self, option: ValidationOption) {
        match option {
            ValidationOption::SkipExpirationCheck => self.skip_expiration_check = true,
            ValidationOption::SkipIssuedAtCheck => self.skip_issued_at_check = true,
            ValidationOption::ExpectedAudience(aud) => self.expected_audience = aud,
            ValidationOption::RequireRole(role) => self.required_roles.push(role),
            ValidationOption::RequireRoles(roles) => self.required_roles.extend(roles),
            ValidationOption::RevocationCheck(check) => self.revocation_check = Some(check),
            ValidationOption::MetricsRecorder(recorder) => self.metrics_recorder = Some(recorder),
        }
    }

    pub fn skips_expiration_check(&self) -> bool {
        self.skip_expiration_check
    }

    pub fn skips_issued_at_check(&self) -> bool {
        self.skip_issued_at_check
    }

    /// Expected audience, if an audience check is configured.
    pub fn expected_audience(&self) -> Option<&str> {
        (!self.expected_audience.is_empty()).then_some(self.expected_audience.as_str())
    }

    pub fn required_roles(&self) -> &[String] {
        &self.required_roles
    }

    pub fn revocation_check(&self) -> Option<&RevocationCheck> {
        self.revocation_check.as_ref()
    }

    pub fn metrics_recorder(&self) -> Option<&Arc<dyn MetricsRecorder>> {
        self.metrics_recorder.as_ref()
    }
}

impl fmt::Debug for ValidationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidationConfig")
            .field("skip_expiration_check", &self.skip_expiration_check)
            .field("skip_issued_at_check", &self.skip_issued_at_check)
            .field("expected_audience", &self.expected_audience)
            .field("required_roles", &self.required_roles)
            .field("revocation_check", &self.revocation_check.is_some())
            .field("metrics_recorder", &self.metrics_recorder.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::TracingRecorder;

    #[test]
    fn test_defaults_check_everything() {
        let config = ValidationConfig::from_options([]);
        assert!(!config.skips_expiration_check());
        assert!(!config.skips_issued_at_check());
        assert!(config.expected_audience().is_none());
        assert!(config.required_roles().is_empty());
        assert!(config.revocation_check().is_none());
        assert!(config.metrics_recorder().is_none());
    }

    #[test]
    fn test_roles_accumulate() {
        let config = ValidationConfig::from_options([
            ValidationOption::require_role("admin"),
            ValidationOption::require_roles(["auditor", "dev"]),
            ValidationOption::require_role("admin"),
        ]);
        assert_eq!(config.required_roles(), ["admin", "auditor", "dev", "admin"]);
    }

    #[test]
    fn test_last_audience_wins() {
        let config = ValidationConfig::from_options([
            ValidationOption::expected_audience("svc-a"),
            ValidationOption::expected_audience("svc-b"),
        ]);
        assert_eq!(config.expected_audience(), Some("svc-b"));

        let config = ValidationConfig::from_options([ValidationOption::expected_audience("")]);
        assert!(config.expected_audience().is_none());
    }

    #[test]
    fn test_last_revocation_check_wins() {
        let config = ValidationConfig::from_options([
            ValidationOption::revocation_check(|_| true),
            ValidationOption::revocation_check(|_| false),
        ]);
        let check = config.revocation_check().unwrap();
        assert!(!check(b"sid".as_slice()));
    }

    #[test]
    fn test_skips_and_recorder() {
        let config = ValidationConfig::from_options([
            ValidationOption::skip_expiration_check(),
            ValidationOption::skip_issued_at_check(),
            ValidationOption::metrics_recorder(Arc::new(TracingRecorder)),
        ]);
        assert!(config.skips_expiration_check());
        assert!(config.skips_issued_at_check());
        assert!(config.metrics_recorder().is_some());
        assert!(format!("{config:?}").contains("metrics_recorder: true"));
    }
}
