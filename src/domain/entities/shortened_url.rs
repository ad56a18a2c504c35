//! Shortened URL entity.

use chrono::{DateTime, Utc};

/// A short code mapped to its original URL.
///
/// Short codes are unique across active and inactive rows. An inactive or
/// expired URL still reserves its code but never resolves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShortenedUrl {
    pub id: i64,
    pub short_code: String,
    pub original_url: String,
    pub owner_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub click_count: i64,
    pub is_custom: bool,
    pub expires_at: Option<DateTime<Utc>>,
    pub is_active: bool,
}

impl ShortenedUrl {
    /// Returns true if the URL has passed its expiry time.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// Returns true if `expires_at <= now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|e| e <= now)
    }

    /// Returns true if a redirect may use this URL.
    pub fn is_resolvable(&self) -> bool {
        self.is_active && !self.is_expired()
    }

    /// Returns true if `user_id` owns this URL.
    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.owner_id.as_deref() == Some(user_id)
    }
}

/// Input data for creating a new shortened URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewShortenedUrl {
    pub short_code: String,
    pub original_url: String,
    pub owner_id: Option<String>,
    pub is_custom: bool,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Partial update for an existing shortened URL.
///
/// `None` fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UrlPatch {
    pub original_url: Option<String>,
    pub short_code: Option<String>,
    pub is_custom: Option<bool>,
}

impl UrlPatch {
    pub fn is_empty(&self) -> bool {
        self.original_url.is_none() && self.short_code.is_none() && self.is_custom.is_none()
    }
}
