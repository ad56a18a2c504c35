//! DTOs for the statistics and availability endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::application::services::UrlStatistics;
use crate::domain::entities::ClickStatistic;

/// One recent click.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentClick {
    pub clicked_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub referrer: Option<String>,
}

impl From<ClickStatistic> for RecentClick {
    fn from(c: ClickStatistic) -> Self {
        Self {
            clicked_at: c.clicked_at,
            country: c.country,
            city: c.city,
            referrer: c.referrer,
        }
    }
}

/// Statistics of one shortened URL.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    pub short_code: String,
    pub original_url: String,
    pub total_clicks: i64,
    pub created_at: DateTime<Utc>,
    pub recent_clicks: Vec<RecentClick>,
}

impl From<UrlStatistics> for StatsResponse {
    fn from(stats: UrlStatistics) -> Self {
        Self {
            short_code: stats.url.short_code,
            original_url: stats.url.original_url,
            total_clicks: stats.url.click_count,
            created_at: stats.url.created_at,
            recent_clicks: stats.recent_clicks.into_iter().map(Into::into).collect(),
        }
    }
}

/// Availability of a short code.
#[derive(Debug, Serialize, Deserialize)]
pub struct AvailabilityResponse {
    pub code: String,
    pub available: bool,
}
