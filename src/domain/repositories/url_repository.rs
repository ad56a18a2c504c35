//! Repository trait for shortened URL data access.

use crate::domain::entities::{NewShortenedUrl, ShortenedUrl, UrlPatch};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Aggregates over all URLs of one owner.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OwnerTotals {
    pub total_urls: i64,
    pub total_clicks: i64,
}

/// Repository interface for shortened URLs.
///
/// The store is the authority on short code uniqueness: inserting or renaming
/// to a code that already exists (active or not) fails with
/// [`AppError::Conflict`].
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgUrlRepository`] - PostgreSQL implementation
/// - [`crate::infrastructure::persistence::MemoryStore`] - In-memory implementation
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UrlRepository: Send + Sync {
    /// Inserts a new shortened URL.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Conflict`] if the short code already exists.
    /// Returns [`AppError::Internal`] on storage errors.
    async fn create(&self, new_url: NewShortenedUrl) -> Result<ShortenedUrl, AppError>;

    /// Finds a URL by short code regardless of its active flag.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on storage errors.
    async fn find_by_code(&self, code: &str) -> Result<Option<ShortenedUrl>, AppError>;

    /// Finds an active URL by short code.
    ///
    /// Expiry is not checked here; see [`ShortenedUrl::is_expired`].
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on storage errors.
    async fn find_active_by_code(&self, code: &str) -> Result<Option<ShortenedUrl>, AppError>;

    /// Returns true if any row, active or not, uses `code`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on storage errors.
    async fn exists(&self, code: &str) -> Result<bool, AppError>;

    /// Lists an owner's URLs, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on storage errors.
    async fn list_by_owner(
        &self,
        owner_id: &str,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<ShortenedUrl>, AppError>;

    /// Counts an owner's URLs and sums their click counters.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on storage errors.
    async fn owner_totals(&self, owner_id: &str) -> Result<OwnerTotals, AppError>;

    /// Applies a partial update and returns the updated row.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if no row has the given id.
    /// Returns [`AppError::Conflict`] if the new short code is taken.
    /// Returns [`AppError::Internal`] on storage errors.
    async fn update(&self, id: i64, patch: UrlPatch) -> Result<ShortenedUrl, AppError>;

    /// Hard-deletes a URL and, by cascade, its clicks.
    ///
    /// Returns `Ok(false)` if no row had the given id.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on storage errors.
    async fn delete(&self, id: i64) -> Result<bool, AppError>;

    /// Sets the active flag; returns `Ok(false)` if the code is unknown.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on storage errors.
    async fn set_active(&self, code: &str, active: bool) -> Result<bool, AppError>;

    /// Deletes every URL that expired before `before`, returning the count.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on storage errors.
    async fn purge_expired(&self, before: DateTime<Utc>) -> Result<u64, AppError>;

    /// Checks that the store is reachable.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] if the store cannot be reached.
    async fn ping(&self) -> Result<(), AppError>;
}
