//! Validation outcome reporting.
//!
//! [`crate::parse`] calls the configured [`MetricsRecorder`] exactly once per
//! invocation, on success and on every failure path.

use crate::context::Context;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Standardized outcome of a validation attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Reason {
    Success,
    InvalidSignature,
    TokenExpired,
    AudienceMismatch,
    InvalidPayload,
    TokenNotYetValid,
    MissingRequiredRole,
    TokenRevoked,
}

impl Reason {
    /// Every reason, in declaration order.
    pub const ALL: [Reason; 8] = [
        Reason::Success,
        Reason::InvalidSignature,
        Reason::TokenExpired,
        Reason::AudienceMismatch,
        Reason::InvalidPayload,
        Reason::TokenNotYetValid,
        Reason::MissingRequiredRole,
        Reason::TokenRevoked,
    ];

    /// Metric label for this reason.
    pub fn as_str(self) -> &'static str {
        match self {
            Reason::Success => "success",
            Reason::InvalidSignature => "invalid_signature",
            Reason::TokenExpired => "token_expired",
            Reason::AudienceMismatch => "audience_mismatch",
            Reason::InvalidPayload => "invalid_payload",
            Reason::TokenNotYetValid => "token_not_yet_valid",
            Reason::MissingRequiredRole => "missing_required_role",
            Reason::TokenRevoked => "token_revoked",
        }
    }

    /// Parse a metric label back into a reason.
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.as_str() == label)
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sink for validation outcomes.
///
/// Called synchronously on the validation path, so implementations should
/// not block and must not panic.
pub trait MetricsRecorder: Send + Sync {
    fn record(&self, ctx: &Context, success: bool, reason: Reason);
}

/// A [`MetricsRecorder`] backed by a closure. Created by [`recorder_fn`].
pub struct FnRecorder<F> {
    f: F,
}

/// Wrap a closure as a [`MetricsRecorder`].
pub fn recorder_fn<F>(f: F) -> FnRecorder<F>
where
    F: Fn(&Context, bool, Reason) + Send + Sync,
{
    FnRecorder { f }
}

impl<F> MetricsRecorder for FnRecorder<F>
where
    F: Fn(&Context, bool, Reason) + Send + Sync,
{
    fn record(&self, ctx: &Context, success: bool, reason: Reason) {
        (self.f)(ctx, success, reason)
    }
}

/// Emits one `debug` level `tracing` event per validation attempt.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingRecorder;

impl MetricsRecorder for TracingRecorder {
    fn record(&self, ctx: &Context, success: bool, reason: Reason) {
        if success {
            tracing::debug!(
                request_id = ctx.request_id(),
                reason = %reason,
                "signet token validated"
            );
        } else {
            tracing::debug!(
                request_id = ctx.request_id(),
                reason = %reason,
                "signet token rejected"
            );
        }
    }
}

/// Lock-free counters per reason.
///
/// Mirrors the usual counter pair of "validations succeeded" and
/// "validations failed by reason".
#[derive(Debug, Default)]
pub struct ValidationCounters {
    counts: [AtomicU64; Reason::ALL.len()],
}

impl ValidationCounters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of attempts recorded with `reason`.
    pub fn count(&self, reason: Reason) -> u64 {
        self.counts[reason.index()].load(Ordering::Relaxed)
    }

    pub fn successes(&self) -> u64 {
        self.count(Reason::Success)
    }

    /// Total failures across all reasons.
    pub fn failures(&self) -> u64 {
        Reason::ALL
            .into_iter()
            .filter(|r| *r != Reason::Success)
            .map(|r| self.count(r))
            .sum()
    }

    /// Non-zero counts as `(label, count)` pairs.
    pub fn snapshot(&self) -> Vec<(&'static str, u64)> {
        Reason::ALL
            .into_iter()
            .map(|r| (r.as_str(), self.count(r)))
            .filter(|(_, n)| *n > 0)
            .collect()
    }
}

impl MetricsRecorder for ValidationCounters {
    fn record(&self, _ctx: &Context, _success: bool, reason: Reason) {
        self.counts[reason.index()].fetch_add(1, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use tracing_subscriber::layer::SubscriberExt;

    #[derive(Clone, Default)]
    struct LevelCapture(Arc<Mutex<Vec<tracing::Level>>>);

    impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for LevelCapture {
        fn on_event(
            &self,
            event: &tracing::Event<'_>,
            _ctx: tracing_subscriber::layer::Context<'_, S>,
        ) {
            self.0.lock().unwrap().push(*event.metadata().level());
        }
    }

    #[test]
    fn test_reason_labels() {
        assert_eq!(Reason::Success.as_str(), "success");
        assert_eq!(Reason::TokenNotYetValid.to_string(), "token_not_yet_valid");
        assert_eq!(
            Reason::from_label("missing_required_role"),
            Some(Reason::MissingRequiredRole)
        );
        assert_eq!(Reason::from_label("nope"), None);
    }

    #[test]
    fn test_counters() {
        let counters = ValidationCounters::new();
        let ctx = Context::new();

        counters.record(&ctx, true, Reason::Success);
        counters.record(&ctx, false, Reason::TokenExpired);
        counters.record(&ctx, false, Reason::TokenExpired);
        counters.record(&ctx, false, Reason::InvalidSignature);

        assert_eq!(counters.successes(), 1);
        assert_eq!(counters.failures(), 3);
        assert_eq!(counters.count(Reason::TokenExpired), 2);
        assert_eq!(
            counters.snapshot(),
            vec![
                ("success", 1),
                ("invalid_signature", 1),
                ("token_expired", 2)
            ]
        );
    }

    #[test]
    fn test_recorder_fn() {
        let seen = Mutex::new(Vec::new());
        let recorder = recorder_fn(|_, success, reason| {
            seen.lock().unwrap().push((success, reason));
        });

        recorder.record(&Context::new(), false, Reason::TokenRevoked);
        assert_eq!(*seen.lock().unwrap(), vec![(false, Reason::TokenRevoked)]);
    }

    #[test]
    fn test_tracing_recorder_logs_at_debug() {
        let capture = LevelCapture::default();
        let subscriber = tracing_subscriber::registry().with(capture.clone());

        tracing::subscriber::with_default(subscriber, || {
            TracingRecorder.record(&Context::new(), true, Reason::Success);
            TracingRecorder.record(&Context::new(), false, Reason::TokenRevoked);
        });

        assert_eq!(
            *capture.0.lock().unwrap(),
            vec![tracing::Level::DEBUG, tracing::Level::DEBUG]
        );
    }
}
