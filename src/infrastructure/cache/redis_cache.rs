//! Redis-backed redirect cache.

use super::service::{CacheError, CacheResult, CacheService};
use async_trait::async_trait;
use redis::{AsyncCommands, Client, aio::ConnectionManager};
use std::time::Duration;
use tracing::{debug, info, warn};

const KEY_PREFIX: &str = "linkshort:url:";

/// Redis cache for redirect targets.
///
/// Uses a `ConnectionManager`, which reconnects transparently. All
/// operations are fail-open.
pub struct RedisCache {
    conn: ConnectionManager,
}

impl RedisCache {
    /// Connects to Redis and validates the connection with a PING.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Connection`] if the URL is invalid, the
    /// connection cannot be established, or the PING fails.
    pub async fn connect(redis_url: &str) -> CacheResult<Self> {
        let client = Client::open(redis_url)
            .map_err(|e| CacheError::Connection(format!("Failed to create Redis client: {e}")))?;

        let conn = ConnectionManager::new(client)
            .await
            .map_err(|e| CacheError::Connection(format!("Failed to connect to Redis: {e}")))?;

        let mut ping_conn = conn.clone();
        ping_conn
            .ping::<()>()
            .await
            .map_err(|e| CacheError::Connection(format!("Redis PING failed: {e}")))?;

        info!("Connected to Redis");

        Ok(Self { conn })
    }

    fn key(short_code: &str) -> String {
        format!("{KEY_PREFIX}{short_code}")
    }
}

#[async_trait]
impl CacheService for RedisCache {
    async fn get_url(&self, short_code: &str) -> Option<String> {
        let mut conn = self.conn.clone();

        match conn.get::<_, Option<String>>(Self::key(short_code)).await {
            Ok(Some(url)) => {
                debug!(code = %short_code, "Cache hit");
                Some(url)
            }
            Ok(None) => {
                debug!(code = %short_code, "Cache miss");
                None
            }
            Err(e) => {
                warn!(code = %short_code, error = %e, "Redis GET failed");
                None
            }
        }
    }

    async fn set_url(&self, short_code: &str, original_url: &str, ttl: Duration) {
        let seconds = ttl.as_secs();
        if seconds == 0 {
            return;
        }

        let mut conn = self.conn.clone();
        if let Err(e) = conn
            .set_ex::<_, _, ()>(Self::key(short_code), original_url, seconds)
            .await
        {
            warn!(code = %short_code, error = %e, "Redis SET failed");
        } else {
            debug!(code = %short_code, ttl_secs = seconds, "Cache set");
        }
    }

    async fn invalidate(&self, short_code: &str) {
        let mut conn = self.conn.clone();

        match conn.del::<_, i64>(Self::key(short_code)).await {
            Ok(deleted) if deleted > 0 => debug!(code = %short_code, "Cache invalidated"),
            Ok(_) => {}
            Err(e) => warn!(code = %short_code, error = %e, "Redis DEL failed"),
        }
    }

    async fn health_check(&self) -> bool {
        let mut conn = self.conn.clone();
        conn.ping::<()>().await.is_ok()
    }

    fn backend(&self) -> &'static str {
        "redis"
    }
}
