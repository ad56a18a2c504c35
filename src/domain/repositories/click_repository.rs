//! Repository trait for click statistics.

use crate::domain::entities::{ClickStatistic, NewClick};
use crate::error::AppError;
use async_trait::async_trait;

/// Repository interface for click records.
///
/// Click rows belong to exactly one shortened URL and are removed with it.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgClickRepository`] - PostgreSQL implementation
/// - [`crate::infrastructure::persistence::MemoryStore`] - In-memory implementation
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ClickRepository: Send + Sync {
    /// Appends a click record and increments the URL's click counter.
    ///
    /// Both writes happen atomically: on error neither is applied, so the
    /// call can be retried without double counting.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] if the referenced URL does not exist.
    /// Returns [`AppError::Internal`] on storage errors.
    async fn record(&self, new_click: NewClick) -> Result<ClickStatistic, AppError>;

    /// Returns up to `limit` clicks of a URL, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on storage errors.
    async fn recent_for_url(
        &self,
        shortened_url_id: i64,
        limit: i64,
    ) -> Result<Vec<ClickStatistic>, AppError>;
}
