//! Public key resolution by key id.
//!
//! Every [`crate::parse`] call invokes its resolver once, synchronously, with
//! the token's `kid`. Resolvers are shared across concurrent validations and
//! must be safe for concurrent use. A resolver failure is reported to the
//! caller as an invalid signature, so callers cannot probe which kids exist.

use crate::context::Context;
use crate::error::BoxError;
use dashmap::DashMap;
use signet_crypto::PublicKey;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Errors returned by key resolvers.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// No key is registered for this kid.
    #[error("unknown key id '{0}'")]
    UnknownKeyId(String),

    /// The request was cancelled before a key could be fetched.
    #[error("key resolution cancelled")]
    Cancelled,

    /// Backing store failure.
    #[error("key source error: {0}")]
    Source(#[source] BoxError),
}

impl ResolveError {
    /// Wrap a backing store error.
    pub fn other(err: impl Into<BoxError>) -> Self {
        ResolveError::Source(err.into())
    }
}

/// Resolves the public key that should verify a token signed under `key_id`.
pub trait KeyResolver: Send + Sync {
    fn resolve(&self, ctx: &Context, key_id: &str) -> Result<PublicKey, ResolveError>;
}

/// A [`KeyResolver`] backed by a closure. Created by [`key_resolver_fn`].
pub struct FnKeyResolver<F> {
    f: F,
}

/// Wrap a closure as a [`KeyResolver`].
pub fn key_resolver_fn<F>(f: F) -> FnKeyResolver<F>
where
    F: Fn(&Context, &str) -> Result<PublicKey, ResolveError> + Send + Sync,
{
    FnKeyResolver { f }
}

impl<F> KeyResolver for FnKeyResolver<F>
where
    F: Fn(&Context, &str) -> Result<PublicKey, ResolveError> + Send + Sync,
{
    fn resolve(&self, ctx: &Context, key_id: &str) -> Result<PublicKey, ResolveError> {
        (self.f)(ctx, key_id)
    }
}

/// Returns the same key for every kid.
#[derive(Debug, Clone, Copy)]
pub struct StaticKeyResolver {
    key: PublicKey,
}

impl StaticKeyResolver {
    pub fn new(key: PublicKey) -> Self {
        Self { key }
    }
}

impl KeyResolver for StaticKeyResolver {
    fn resolve(&self, _ctx: &Context, _key_id: &str) -> Result<PublicKey, ResolveError> {
        Ok(self.key)
    }
}

/// Fixed set of keys indexed by kid.
///
/// Tokens with an empty kid resolve to the default key when one is set,
/// which keeps tokens minted before key ids were introduced verifiable.
#[derive(Debug, Clone, Default)]
pub struct KeyRing {
    keys: HashMap<String, PublicKey>,
    default_key: Option<PublicKey>,
}

impl KeyRing {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a key for `key_id`.
    pub fn with_key(mut self, key_id: impl Into<String>, key: PublicKey) -> Self {
        self.insert(key_id, key);
        self
    }

    /// Set the key used for tokens without a kid.
    pub fn with_default(mut self, key: PublicKey) -> Self {
        self.default_key = Some(key);
        self
    }

    /// Add or replace a key for `key_id`.
    pub fn insert(&mut self, key_id: impl Into<String>, key: PublicKey) -> Option<PublicKey> {
        self.keys.insert(key_id.into(), key)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty() && self.default_key.is_none()
    }

    /// Registered key ids, sorted.
    pub fn key_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.keys.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }
}

impl KeyResolver for KeyRing {
    fn resolve(&self, _ctx: &Context, key_id: &str) -> Result<PublicKey, ResolveError> {
        if key_id.is_empty() {
            if let Some(key) = self.default_key {
                return Ok(key);
            }
        }
        self.keys
            .get(key_id)
            .copied()
            .ok_or_else(|| ResolveError::UnknownKeyId(key_id.to_string()))
    }
}

#[derive(Debug, Clone, Copy)]
struct CacheEntry {
    key: PublicKey,
    expires_at: Instant,
}

/// Caches another resolver's keys for a fixed time-to-live.
///
/// Only successful lookups are cached. Cache hits ignore cancellation; a miss
/// on a cancelled context fails with [`ResolveError::Cancelled`] without
/// reaching the inner resolver.
pub struct CachingKeyResolver<R> {
    inner: R,
    ttl: Duration,
    cache: DashMap<String, CacheEntry>,
}

impl<R: KeyResolver> CachingKeyResolver<R> {
    pub fn new(inner: R, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            cache: DashMap::new(),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Drop one cached key, e.g. after a key is retired.
    pub fn invalidate(&self, key_id: &str) {
        self.cache.remove(key_id);
    }

    pub fn clear(&self) {
        self.cache.clear();
    }

    /// Number of cached entries, including expired ones not yet evicted.
    pub fn cached_len(&self) -> usize {
        self.cache.len()
    }

    pub fn inner(&self) -> &R {
        &self.inner
    }
}

impl<R: KeyResolver> KeyResolver for CachingKeyResolver<R> {
    fn resolve(&self, ctx: &Context, key_id: &str) -> Result<PublicKey, ResolveError> {
        let now = Instant::now();
        let cached = self.cache.get(key_id).map(|entry| *entry);
        if let Some(entry) = cached {
            if now < entry.expires_at {
                tracing::trace!(kid = key_id, "key cache hit");
                return Ok(entry.key);
            }
            // Only evict if no other caller refreshed it meanwhile.
            self.cache.remove_if(key_id, |_, e| e.expires_at <= now);
        }

        if ctx.is_cancelled() {
            return Err(ResolveError::Cancelled);
        }

        tracing::trace!(kid = key_id, "key cache miss");
        let key = self.inner.resolve(ctx, key_id)?;
        self.cache.insert(
            key_id.to_string(),
            CacheEntry {
                key,
                expires_at: Instant::now() + self.ttl,
            },
        );
        Ok(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use signet_crypto::KeyPair;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn counting_resolver(key: PublicKey, calls: Arc<AtomicUsize>) -> impl KeyResolver {
        key_resolver_fn(move |_, kid| {
            calls.fetch_add(1, Ordering::SeqCst);
            if kid == "v1" {
                Ok(key)
            } else {
                Err(ResolveError::UnknownKeyId(kid.to_string()))
            }
        })
    }

    #[test]
    fn test_key_ring_lookup() {
        let v1 = KeyPair::generate().public_key();
        let v2 = KeyPair::generate().public_key();
        let legacy = KeyPair::generate().public_key();
        let ring = KeyRing::new()
            .with_key("v1", v1)
            .with_key("v2", v2)
            .with_default(legacy);
        let ctx = Context::new();

        assert_eq!(ring.resolve(&ctx, "v1").unwrap(), v1);
        assert_eq!(ring.resolve(&ctx, "v2").unwrap(), v2);
        assert_eq!(ring.resolve(&ctx, "").unwrap(), legacy);
        assert!(matches!(
            ring.resolve(&ctx, "v3"),
            Err(ResolveError::UnknownKeyId(kid)) if kid == "v3"
        ));
        assert_eq!(ring.key_ids(), vec!["v1", "v2"]);
    }

    #[test]
    fn test_key_ring_without_default() {
        let ring = KeyRing::new().with_key("v1", KeyPair::generate().public_key());
        assert!(ring.resolve(&Context::new(), "").is_err());
    }

    #[test]
    fn test_caching_resolver_hits_cache() {
        let key = KeyPair::generate().public_key();
        let calls = Arc::new(AtomicUsize::new(0));
        let resolver = CachingKeyResolver::new(
            counting_resolver(key, calls.clone()),
            Duration::from_secs(60),
        );
        let ctx = Context::new();

        for _ in 0..5 {
            assert_eq!(resolver.resolve(&ctx, "v1").unwrap(), key);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(resolver.cached_len(), 1);

        resolver.invalidate("v1");
        resolver.resolve(&ctx, "v1").unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_caching_resolver_refetches_after_ttl() {
        let key = KeyPair::generate().public_key();
        let calls = Arc::new(AtomicUsize::new(0));
        let resolver =
            CachingKeyResolver::new(counting_resolver(key, calls.clone()), Duration::ZERO);
        let ctx = Context::new();

        resolver.resolve(&ctx, "v1").unwrap();
        resolver.resolve(&ctx, "v1").unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_caching_resolver_does_not_cache_failures() {
        let key = KeyPair::generate().public_key();
        let calls = Arc::new(AtomicUsize::new(0));
        let resolver = CachingKeyResolver::new(
            counting_resolver(key, calls.clone()),
            Duration::from_secs(60),
        );
        let ctx = Context::new();

        assert!(resolver.resolve(&ctx, "nope").is_err());
        assert!(resolver.resolve(&ctx, "nope").is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(resolver.cached_len(), 0);
    }

    #[test]
    fn test_caching_resolver_honours_cancellation_on_miss() {
        let key = KeyPair::generate().public_key();
        let calls = Arc::new(AtomicUsize::new(0));
        let resolver = CachingKeyResolver::new(
            counting_resolver(key, calls.clone()),
            Duration::from_secs(60),
        );

        let live = Context::new();
        resolver.resolve(&live, "v1").unwrap();

        let cancelled = Context::new();
        cancelled.cancellation_token().cancel();

        // Cached key is still served.
        assert_eq!(resolver.resolve(&cancelled, "v1").unwrap(), key);
        resolver.clear();
        assert!(matches!(
            resolver.resolve(&cancelled, "v1"),
            Err(ResolveError::Cancelled)
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_caching_resolver_concurrent_use() {
        let key = KeyPair::generate().public_key();
        let calls = Arc::new(AtomicUsize::new(0));
        let resolver = CachingKeyResolver::new(
            counting_resolver(key, calls.clone()),
            Duration::from_secs(60),
        );

        std::thread::scope(|s| {
            for _ in 0..8 {
                s.spawn(|| {
                    let ctx = Context::new();
                    for _ in 0..100 {
                        assert_eq!(resolver.resolve(&ctx, "v1").unwrap(), key);
                    }
                });
            }
        });

        // Racing misses may each fetch once, but never more than the thread count.
        let fetched = calls.load(Ordering::SeqCst);
        assert!((1..=8).contains(&fetched));
    }
}
