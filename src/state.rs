//! Shared application state injected into every handler.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::mpsc;

use crate::application::services::{AuthService, QrService, ShortenerService};
use crate::domain::click_event::ClickEvent;
use crate::domain::repositories::UrlRepository;
use crate::infrastructure::cache::CacheService;

/// Cheaply cloneable handle to services and request-independent settings.
#[derive(Clone)]
pub struct AppState {
    pub shortener: Arc<ShortenerService>,
    pub auth_service: Arc<AuthService>,
    pub qr_service: Arc<QrService>,
    /// Store handle for readiness probes.
    pub store: Arc<dyn UrlRepository>,
    pub cache: Arc<dyn CacheService>,
    pub click_tx: mpsc::Sender<ClickEvent>,
    /// Configured public base URL; `None` derives it from the request.
    pub base_url: Option<String>,
    pub behind_proxy: bool,
    pub cache_ttl: Duration,
    /// Bumped on every invalidation; stale background fills check it.
    pub cache_epoch: Arc<AtomicU64>,
}

impl AppState {
    /// Returns a builder-style copy with a fixed public base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Current invalidation epoch, read before resolving a cache miss.
    pub fn cache_epoch(&self) -> u64 {
        self.cache_epoch.load(Ordering::SeqCst)
    }

    /// Drops the cached redirect for `code`.
    ///
    /// Call after the store change is committed.
    pub async fn invalidate_cached(&self, code: &str) {
        self.cache_epoch.fetch_add(1, Ordering::SeqCst);
        self.cache.invalidate(code).await;
    }

    /// Caches a resolved redirect unless an invalidation ran since
    /// `seen_epoch` was read.
    ///
    /// The epoch is checked again after the write, so a fill racing an
    /// invalidation in this process never survives it.
    pub async fn fill_cache(&self, seen_epoch: u64, code: &str, original_url: &str, ttl: Duration) {
        if self.cache_epoch() != seen_epoch {
            return;
        }

        self.cache.set_url(code, original_url, ttl).await;

        if self.cache_epoch() != seen_epoch {
            self.cache.invalidate(code).await;
        }
    }

    /// Share of the click queue currently in use, in percent.
    pub fn click_queue_usage_percent(&self) -> u8 {
        let max = self.click_tx.max_capacity();
        if max == 0 {
            return 0;
        }
        let used = max - self.click_tx.capacity();
        ((used * 100) / max).min(100) as u8
    }
}
