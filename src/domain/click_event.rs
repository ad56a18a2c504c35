//! Click event model for asynchronous click tracking.

use chrono::{DateTime, Utc};

use crate::domain::entities::ClickMetadata;
use crate::utils::request_info::truncate_header_value;

/// A click captured by the redirect handler and queued for the worker.
///
/// Passed over a bounded channel so redirects never wait on analytics
/// writes. The timestamp is taken at capture time, not at write time.
#[derive(Debug, Clone)]
pub struct ClickEvent {
    pub code: String,
    pub ip: Option<String>,
    pub user_agent: Option<String>,
    pub referrer: Option<String>,
    pub clicked_at: DateTime<Utc>,
}

impl ClickEvent {
    /// Creates a new click event stamped with the current time.
    ///
    /// User agent and referrer are truncated to the stored column width.
    ///
    /// # Examples
    ///
    /// ```ignore
    /// let event = ClickEvent::new(
    ///     "abc123".to_string(),
    ///     Some("192.168.1.1".to_string()),
    ///     Some("Mozilla/5.0"),
    ///     Some("https://google.com"),
    /// );
    /// ```
    pub fn new(
        code: String,
        ip: Option<String>,
        user_agent: Option<&str>,
        referrer: Option<&str>,
    ) -> Self {
        Self {
            code,
            ip,
            user_agent: user_agent.map(truncate_header_value),
            referrer: referrer.map(truncate_header_value),
            clicked_at: Utc::now(),
        }
    }

    /// Splits the event into its code and the metadata to persist.
    pub fn into_parts(self) -> (String, ClickMetadata) {
        let metadata = ClickMetadata {
            ip_address: self.ip,
            user_agent: self.user_agent,
            referrer: self.referrer,
            clicked_at: Some(self.clicked_at),
        };
        (self.code, metadata)
    }
}
