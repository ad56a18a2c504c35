//! Click statistic entity representing a single redirect event.

use chrono::{DateTime, Utc};

/// A click recorded when a short code is resolved by the redirect endpoint.
///
/// `country` and `city` are kept for schema compatibility and stay empty,
/// there is no geo lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClickStatistic {
    pub id: i64,
    pub shortened_url_id: i64,
    pub clicked_at: DateTime<Utc>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub referrer: Option<String>,
    pub country: Option<String>,
    pub city: Option<String>,
}

/// Client metadata captured at redirect time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClickMetadata {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub referrer: Option<String>,
    pub clicked_at: Option<DateTime<Utc>>,
}

/// Input data for recording a new click.
///
/// `shortened_url_id` must reference an existing URL. When `clicked_at` is
/// `None` the store uses the current time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewClick {
    pub shortened_url_id: i64,
    pub clicked_at: Option<DateTime<Utc>>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub referrer: Option<String>,
}

impl NewClick {
    pub fn from_metadata(shortened_url_id: i64, metadata: ClickMetadata) -> Self {
        Self {
            shortened_url_id,
            clicked_at: metadata.clicked_at,
            ip_address: metadata.ip_address,
            user_agent: metadata.user_agent,
            referrer: metadata.referrer,
        }
    }
}
