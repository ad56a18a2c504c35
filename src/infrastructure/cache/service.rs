//! Redirect cache trait and error types.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::time::Duration;

/// Errors that can occur while setting up or using a cache backend.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Cache connection error: {0}")]
    Connection(String),
    #[error("Cache operation error: {0}")]
    Operation(String),
}

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Cache of `short code -> original URL` used by the redirect path.
///
/// Implementations are fail-open: backend errors are logged and reported as
/// misses so redirects fall back to the store.
#[async_trait]
pub trait CacheService: Send + Sync {
    /// Returns the cached target for `short_code`, `None` on miss or error.
    async fn get_url(&self, short_code: &str) -> Option<String>;

    /// Caches a target for at most `ttl`.
    async fn set_url(&self, short_code: &str, original_url: &str, ttl: Duration);

    /// Drops the entry for `short_code`.
    ///
    /// Called whenever a URL is updated, renamed or deleted.
    async fn invalidate(&self, short_code: &str);

    /// Returns true if the backend answers.
    async fn health_check(&self) -> bool;

    /// Short backend name for health reports.
    fn backend(&self) -> &'static str;
}

/// Computes the TTL of a cache entry.
///
/// Entries never outlive the URL's expiry. Returns `None` when the URL is
/// already expired or expires within the second.
pub fn entry_ttl(
    default_ttl: Duration,
    expires_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Option<Duration> {
    let Some(expires_at) = expires_at else {
        return Some(default_ttl);
    };

    let remaining = (expires_at - now).num_seconds();
    if remaining < 1 {
        return None;
    }

    Some(default_ttl.min(Duration::from_secs(remaining as u64)))
}
