//! No-op cache used when Redis is not configured.

use super::service::CacheService;
use async_trait::async_trait;
use std::time::Duration;

/// A cache that never stores anything; every lookup is a miss.
#[derive(Debug, Default)]
pub struct NullCache;

impl NullCache {
    pub fn new() -> Self {
        tracing::debug!("Using NullCache (caching disabled)");
        Self
    }
}

#[async_trait]
impl CacheService for NullCache {
    async fn get_url(&self, _short_code: &str) -> Option<String> {
        None
    }

    async fn set_url(&self, _short_code: &str, _original_url: &str, _ttl: Duration) {}

    async fn invalidate(&self, _short_code: &str) {}

    async fn health_check(&self) -> bool {
        true
    }

    fn backend(&self) -> &'static str {
        "disabled"
    }
}
