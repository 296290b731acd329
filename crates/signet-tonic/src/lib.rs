//! gRPC integration for Signet tokens.
//!
//! Tokens travel in the `authorization-bin` binary metadata entry. On the
//! server, [`SignetInterceptor`] verifies the token and stores the resulting
//! [`Claims`] in the request extensions, where handlers read them back with
//! [`claims_from_request`]. On the client, [`TokenAttacher`] or
//! [`attach_token`] set the entry.
//!
//! ```rust,ignore
//! let validator = Validator::new(StaticKeyResolver::new(public_key))
//!     .with_option(ValidationOption::expected_audience("orders"));
//! let svc = OrdersServer::with_interceptor(orders, SignetInterceptor::new(validator));
//! ```

use signet::{Claims, Context, ErrorKind, PublicKey, SignetError, StaticKeyResolver};
use signet::{ValidationOption, Validator};
use tonic::metadata::MetadataValue;
use tonic::service::Interceptor;
use tonic::{Request, Status};

/// Binary metadata key carrying the raw token bytes.
pub const AUTHORIZATION_METADATA_KEY: &str = "authorization-bin";

/// Optional ASCII metadata key used to tag the validation context.
pub const REQUEST_ID_METADATA_KEY: &str = "x-request-id";

/// Server-side interceptor that rejects requests without a valid token.
#[derive(Debug, Clone)]
pub struct SignetInterceptor {
    validator: Validator,
}

impl SignetInterceptor {
    pub fn new(validator: Validator) -> Self {
        Self { validator }
    }

    /// Verify every token against a single public key.
    pub fn with_public_key(
        public_key: PublicKey,
        options: impl IntoIterator<Item = ValidationOption>,
    ) -> Self {
        Self::new(Validator::new(StaticKeyResolver::new(public_key)).with_options(options))
    }

    pub fn validator(&self) -> &Validator {
        &self.validator
    }
}

impl Interceptor for SignetInterceptor {
    fn call(&mut self, mut request: Request<()>) -> Result<Request<()>, Status> {
        let token = extract_token(&request)?;

        let mut ctx = Context::new();
        if let Some(request_id) = request
            .metadata()
            .get(REQUEST_ID_METADATA_KEY)
            .and_then(|v| v.to_str().ok())
        {
            ctx = ctx.with_request_id(request_id);
        }

        let claims = self
            .validator
            .parse(&ctx, &token)
            .map_err(|err| status_for_error(&err))?;

        request.extensions_mut().insert(claims);
        Ok(request)
    }
}

fn extract_token(request: &Request<()>) -> Result<Vec<u8>, Status> {
    let value = request
        .metadata()
        .get_bin(AUTHORIZATION_METADATA_KEY)
        .ok_or_else(|| Status::unauthenticated("missing signet token in authorization-bin"))?;

    let token = value
        .to_bytes()
        .map_err(|_| Status::unauthenticated("malformed authorization-bin metadata"))?;
    if token.is_empty() {
        return Err(Status::unauthenticated(
            "missing signet token in authorization-bin",
        ));
    }
    Ok(token.to_vec())
}

/// Map a validation failure to a gRPC status.
///
/// Malformed or unverifiable tokens are `UNAUTHENTICATED` with a generic
/// message. Authentic tokens that fail a policy check are `PERMISSION_DENIED`
/// and say which check failed.
pub fn status_for_error(err: &SignetError) -> Status {
    match err.kind() {
        ErrorKind::InvalidSignature | ErrorKind::InvalidPayload => {
            Status::unauthenticated("invalid or corrupted token")
        }
        ErrorKind::TokenNotYetValid => Status::unauthenticated("token not yet valid"),
        ErrorKind::TokenExpired
        | ErrorKind::AudienceMismatch
        | ErrorKind::MissingRequiredRole
        | ErrorKind::TokenRevoked => {
            Status::permission_denied(format!("token not authorized: {err}"))
        }
        _ => {
            tracing::warn!(error = %err, "unexpected signet authentication error");
            Status::unauthenticated("internal authentication failure")
        }
    }
}

/// Claims stored by [`SignetInterceptor`], if the request went through it.
pub fn claims_from_request<T>(request: &Request<T>) -> Option<&Claims> {
    request.extensions().get::<Claims>()
}

/// Set the `authorization-bin` entry on an outgoing request.
pub fn attach_token<T>(request: &mut Request<T>, token: &[u8]) {
    request.metadata_mut().insert_bin(
        AUTHORIZATION_METADATA_KEY,
        MetadataValue::from_bytes(token),
    );
}

/// Client-side interceptor that attaches a fixed token to every call.
#[derive(Debug, Clone)]
pub struct TokenAttacher {
    token: Vec<u8>,
}

impl TokenAttacher {
    pub fn new(token: impl Into<Vec<u8>>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

impl Interceptor for TokenAttacher {
    fn call(&mut self, mut request: Request<()>) -> Result<Request<()>, Status> {
        attach_token(&mut request, &self.token);
        Ok(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use signet::resolver::ResolveError;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (SignetError::TokenRevoked, tonic::Code::PermissionDenied),
            (
                SignetError::TokenExpired { expires_at: 1 },
                tonic::Code::PermissionDenied,
            ),
            (
                SignetError::TokenNotYetValid { issued_at: 1 },
                tonic::Code::Unauthenticated,
            ),
            (
                SignetError::MissingEnvelopeField("payload"),
                tonic::Code::Unauthenticated,
            ),
            (
                SignetError::KeyResolution {
                    key_id: "v9".into(),
                    source: ResolveError::UnknownKeyId("v9".into()),
                },
                tonic::Code::Unauthenticated,
            ),
            (
                SignetError::InvalidExpiryOrder {
                    issued_at: 2,
                    expires_at: 1,
                },
                tonic::Code::Unauthenticated,
            ),
        ];

        for (err, code) in cases {
            assert_eq!(status_for_error(&err).code(), code, "{err}");
        }
    }

    #[test]
    fn test_unknown_kid_does_not_leak() {
        let err = SignetError::KeyResolution {
            key_id: "secret-kid".into(),
            source: ResolveError::UnknownKeyId("secret-kid".into()),
        };
        assert!(!status_for_error(&err).message().contains("secret-kid"));
    }
}
