//! In-memory implementation of the URL and click repositories.
//!
//! Used by tests and by `STORAGE_BACKEND=memory` for local development.
//! Data lives for the lifetime of the process.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::json;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;

use crate::domain::entities::{ClickStatistic, NewClick, NewShortenedUrl, ShortenedUrl, UrlPatch};
use crate::domain::repositories::{ClickRepository, OwnerTotals, UrlRepository};
use crate::error::AppError;

#[derive(Default)]
struct Inner {
    urls: BTreeMap<i64, ShortenedUrl>,
    codes: HashMap<String, i64>,
    clicks: Vec<ClickStatistic>,
    next_url_id: i64,
    next_click_id: i64,
}

impl Inner {
    fn by_code(&self, code: &str) -> Option<&ShortenedUrl> {
        self.codes.get(code).and_then(|id| self.urls.get(id))
    }

    fn remove(&mut self, id: i64) -> bool {
        let Some(url) = self.urls.remove(&id) else {
            return false;
        };
        self.codes.remove(&url.short_code);
        self.clicks.retain(|c| c.shortened_url_id != id);
        true
    }
}

/// Repository backed by process memory.
///
/// A single lock guards URLs, the code index and clicks, so code uniqueness
/// and cascade deletes hold under concurrent access.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of click rows stored for a URL.
    pub async fn click_count_for(&self, shortened_url_id: i64) -> usize {
        self.inner
            .read()
            .await
            .clicks
            .iter()
            .filter(|c| c.shortened_url_id == shortened_url_id)
            .count()
    }
}

fn duplicate_code(code: &str) -> AppError {
    AppError::conflict(
        "Unique constraint violation",
        json!({ "constraint": "shortened_urls_short_code_key", "code": code }),
    )
}

#[async_trait]
impl UrlRepository for MemoryStore {
    async fn create(&self, new_url: NewShortenedUrl) -> Result<ShortenedUrl, AppError> {
        let mut inner = self.inner.write().await;

        if inner.codes.contains_key(&new_url.short_code) {
            return Err(duplicate_code(&new_url.short_code));
        }

        inner.next_url_id += 1;
        let url = ShortenedUrl {
            id: inner.next_url_id,
            short_code: new_url.short_code,
            original_url: new_url.original_url,
            owner_id: new_url.owner_id,
            created_at: Utc::now(),
            click_count: 0,
            is_custom: new_url.is_custom,
            expires_at: new_url.expires_at,
            is_active: true,
        };

        inner.codes.insert(url.short_code.clone(), url.id);
        inner.urls.insert(url.id, url.clone());

        Ok(url)
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<ShortenedUrl>, AppError> {
        Ok(self.inner.read().await.by_code(code).cloned())
    }

    async fn find_active_by_code(&self, code: &str) -> Result<Option<ShortenedUrl>, AppError> {
        Ok(self
            .inner
            .read()
            .await
            .by_code(code)
            .filter(|url| url.is_active)
            .cloned())
    }

    async fn exists(&self, code: &str) -> Result<bool, AppError> {
        Ok(self.inner.read().await.codes.contains_key(code))
    }

    async fn list_by_owner(
        &self,
        owner_id: &str,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<ShortenedUrl>, AppError> {
        let inner = self.inner.read().await;

        let mut owned: Vec<&ShortenedUrl> = inner
            .urls
            .values()
            .filter(|url| url.is_owned_by(owner_id))
            .collect();
        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        Ok(owned
            .into_iter()
            .skip(usize::try_from(offset).unwrap_or(usize::MAX))
            .take(usize::try_from(limit).unwrap_or(0))
            .cloned()
            .collect())
    }

    async fn owner_totals(&self, owner_id: &str) -> Result<OwnerTotals, AppError> {
        let inner = self.inner.read().await;

        Ok(inner
            .urls
            .values()
            .filter(|url| url.is_owned_by(owner_id))
            .fold(OwnerTotals::default(), |acc, url| OwnerTotals {
                total_urls: acc.total_urls + 1,
                total_clicks: acc.total_clicks + url.click_count,
            }))
    }

    async fn update(&self, id: i64, patch: UrlPatch) -> Result<ShortenedUrl, AppError> {
        let mut inner = self.inner.write().await;

        let Some(current_code) = inner.urls.get(&id).map(|u| u.short_code.clone()) else {
            return Err(AppError::not_found("Short URL not found", json!({ "id": id })));
        };

        if let Some(new_code) = patch.short_code.as_deref()
            && new_code != current_code
        {
            if inner.codes.contains_key(new_code) {
                return Err(duplicate_code(new_code));
            }
            inner.codes.remove(&current_code);
            inner.codes.insert(new_code.to_string(), id);
        }

        let Some(url) = inner.urls.get_mut(&id) else {
            return Err(AppError::not_found("Short URL not found", json!({ "id": id })));
        };

        if let Some(original_url) = patch.original_url {
            url.original_url = original_url;
        }
        if let Some(short_code) = patch.short_code {
            url.short_code = short_code;
        }
        if let Some(is_custom) = patch.is_custom {
            url.is_custom = is_custom;
        }

        Ok(url.clone())
    }

    async fn delete(&self, id: i64) -> Result<bool, AppError> {
        Ok(self.inner.write().await.remove(id))
    }

    async fn set_active(&self, code: &str, active: bool) -> Result<bool, AppError> {
        let mut inner = self.inner.write().await;

        let Some(id) = inner.codes.get(code).copied() else {
            return Ok(false);
        };

        Ok(match inner.urls.get_mut(&id) {
            Some(url) => {
                url.is_active = active;
                true
            }
            None => false,
        })
    }

    async fn purge_expired(&self, before: DateTime<Utc>) -> Result<u64, AppError> {
        let mut inner = self.inner.write().await;

        let expired: Vec<i64> = inner
            .urls
            .values()
            .filter(|url| url.is_expired_at(before))
            .map(|url| url.id)
            .collect();

        Ok(expired.into_iter().filter(|id| inner.remove(*id)).count() as u64)
    }

    async fn ping(&self) -> Result<(), AppError> {
        Ok(())
    }
}

#[async_trait]
impl ClickRepository for MemoryStore {
    async fn record(&self, new_click: NewClick) -> Result<ClickStatistic, AppError> {
        let mut inner = self.inner.write().await;

        let Some(url) = inner.urls.get_mut(&new_click.shortened_url_id) else {
            return Err(AppError::bad_request(
                "Referenced record does not exist",
                json!({ "shortened_url_id": new_click.shortened_url_id }),
            ));
        };
        url.click_count += 1;

        inner.next_click_id += 1;
        let click = ClickStatistic {
            id: inner.next_click_id,
            shortened_url_id: new_click.shortened_url_id,
            clicked_at: new_click.clicked_at.unwrap_or_else(Utc::now),
            ip_address: new_click.ip_address,
            user_agent: new_click.user_agent,
            referrer: new_click.referrer,
            country: None,
            city: None,
        };
        inner.clicks.push(click.clone());

        Ok(click)
    }

    async fn recent_for_url(
        &self,
        shortened_url_id: i64,
        limit: i64,
    ) -> Result<Vec<ClickStatistic>, AppError> {
        let inner = self.inner.read().await;

        let mut clicks: Vec<&ClickStatistic> = inner
            .clicks
            .iter()
            .filter(|c| c.shortened_url_id == shortened_url_id)
            .collect();
        clicks.sort_by(|a, b| b.clicked_at.cmp(&a.clicked_at).then(b.id.cmp(&a.id)));

        Ok(clicks
            .into_iter()
            .take(usize::try_from(limit).unwrap_or(0))
            .cloned()
            .collect())
    }
}
