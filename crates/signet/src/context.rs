//! Request-scoped context passed through a validation call.

use tokio_util::sync::CancellationToken;

/// Carries cancellation and request identity into the key resolver and the
/// metrics sink.
///
/// The validator itself never waits on the token; resolvers that do I/O are
/// expected to check it.
#[derive(Debug, Clone)]
pub struct Context {
    cancellation: CancellationToken,
    request_id: Option<String>,
}

impl Context {
    /// A fresh, uncancelled context.
    pub fn new() -> Self {
        Self {
            cancellation: CancellationToken::new(),
            request_id: None,
        }
    }

    /// Use an existing cancellation token, typically a child of the
    /// server's shutdown token.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    /// Tag the context with a request id for logs and metrics.
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancellation
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    pub fn request_id(&self) -> Option<&str> {
        self.request_id.as_deref()
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}
