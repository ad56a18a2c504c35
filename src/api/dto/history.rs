//! DTOs for the history endpoint.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, serde_as};

use crate::application::services::shortener_service::DEFAULT_PAGE_SIZE;
use crate::application::services::{ShortenerService, UrlHistory};
use crate::domain::entities::ShortenedUrl;

/// Pagination query parameters.
///
/// Uses `serde_with` to parse numbers from query strings. Range checks are
/// done by the service.
#[serde_as]
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryQuery {
    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default)]
    pub page: Option<i64>,

    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default)]
    pub page_size: Option<i64>,
}

impl HistoryQuery {
    /// Returns `(page, page_size)` with defaults applied.
    pub fn resolved(&self) -> (i64, i64) {
        (self.page.unwrap_or(1), self.page_size.unwrap_or(DEFAULT_PAGE_SIZE))
    }
}

/// One URL in a history page.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryItem {
    pub short_code: String,
    pub short_url: String,
    pub original_url: String,
    pub click_count: i64,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub expires_at: Option<DateTime<Utc>>,
    pub is_custom: bool,
    pub qr_code_url: String,
}

impl HistoryItem {
    fn new(url: ShortenedUrl, base_url: &str) -> Self {
        Self {
            short_url: ShortenerService::short_url(base_url, &url.short_code),
            qr_code_url: ShortenerService::qr_code_url(base_url, &url.short_code),
            short_code: url.short_code,
            original_url: url.original_url,
            click_count: url.click_count,
            created_at: url.created_at,
            expires_at: url.expires_at,
            is_custom: url.is_custom,
        }
    }
}

/// A page of the caller's URLs with totals over all of them.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryResponse {
    pub urls: Vec<HistoryItem>,
    pub page: i64,
    pub page_size: i64,
    pub total_urls: i64,
    pub total_clicks: i64,
}

impl HistoryResponse {
    pub fn new(history: UrlHistory, base_url: &str) -> Self {
        Self {
            urls: history
                .urls
                .into_iter()
                .map(|url| HistoryItem::new(url, base_url))
                .collect(),
            page: history.page,
            page_size: history.page_size,
            total_urls: history.total_urls,
            total_clicks: history.total_clicks,
        }
    }
}
