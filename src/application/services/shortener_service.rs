//! URL shortening, resolution, analytics and ownership rules.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde_json::json;

use crate::domain::entities::{ClickMetadata, ClickStatistic, NewClick, NewShortenedUrl, ShortenedUrl, UrlPatch};
use crate::domain::repositories::{ClickRepository, UrlRepository};
use crate::error::AppError;
use crate::utils::code_generator::{generate_unique_code, validate_custom_code};
use crate::utils::url_validation::validate_target_url;

/// Insert attempts for a random code before giving up.
const MAX_INSERT_ATTEMPTS: usize = 5;

/// Most recent clicks returned with statistics.
pub const RECENT_CLICKS_LIMIT: i64 = 100;

pub const DEFAULT_PAGE_SIZE: i64 = 20;
pub const MAX_PAGE_SIZE: i64 = 100;

pub const MAX_EXPIRY_DAYS: i64 = 3650;

/// Input of [`ShortenerService::shorten`].
#[derive(Debug, Clone, Default)]
pub struct ShortenCommand {
    pub url: String,
    pub owner_id: Option<String>,
    pub custom_code: Option<String>,
    pub expires_in_days: Option<i64>,
}

/// Input of [`ShortenerService::update`].
///
/// `regenerate` wins over `new_code`.
#[derive(Debug, Clone, Default)]
pub struct UpdateCommand {
    pub url: Option<String>,
    pub new_code: Option<String>,
    pub regenerate: bool,
}

/// Redirect target of a resolvable code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTarget {
    pub original_url: String,
    pub expires_at: Option<DateTime<Utc>>,
}

/// A URL with its most recent clicks, newest first.
#[derive(Debug, Clone)]
pub struct UrlStatistics {
    pub url: ShortenedUrl,
    pub recent_clicks: Vec<ClickStatistic>,
}

/// One page of an owner's URLs plus totals over all of them.
#[derive(Debug, Clone)]
pub struct UrlHistory {
    pub urls: Vec<ShortenedUrl>,
    pub page: i64,
    pub page_size: i64,
    pub total_urls: i64,
    pub total_clicks: i64,
}

/// Service owning every business rule around shortened URLs.
///
/// Custom codes require an authenticated owner. Only owners may read
/// statistics of owned URLs, update them or delete them; anonymous URLs have
/// public statistics. The store is the final authority on code uniqueness,
/// duplicate-key failures on random codes are retried.
pub struct ShortenerService {
    urls: Arc<dyn UrlRepository>,
    clicks: Arc<dyn ClickRepository>,
}

impl ShortenerService {
    /// Creates a new shortener service.
    pub fn new(urls: Arc<dyn UrlRepository>, clicks: Arc<dyn ClickRepository>) -> Self {
        Self { urls, clicks }
    }

    /// Creates a new shortened URL.
    ///
    /// Checks run in order: URL format, custom-code authorization, custom-code
    /// format, custom-code availability. An empty custom code counts as absent.
    ///
    /// # Errors
    ///
    /// - [`AppError::Validation`] for a malformed URL, custom code or expiry
    /// - [`AppError::Unauthorized`] for a custom code without an owner
    /// - [`AppError::Conflict`] if the custom code is taken
    /// - [`AppError::Internal`] on storage errors
    pub async fn shorten(&self, cmd: ShortenCommand) -> Result<ShortenedUrl, AppError> {
        let original_url = checked_url(&cmd.url)?;
        let expires_at = expiry_from_days(cmd.expires_in_days)?;

        let custom_code = cmd
            .custom_code
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());

        if let Some(code) = custom_code {
            let Some(owner_id) = cmd.owner_id else {
                return Err(AppError::unauthorized(
                    "Authentication required to use custom codes",
                    json!({ "code": code }),
                ));
            };

            validate_custom_code(&code)?;

            if self.urls.exists(&code).await? {
                return Err(code_taken(&code));
            }

            let new_url = NewShortenedUrl {
                short_code: code.clone(),
                original_url,
                owner_id: Some(owner_id),
                is_custom: true,
                expires_at,
            };

            return self.urls.create(new_url).await.map_err(|e| {
                if e.is_conflict() { code_taken(&code) } else { e }
            });
        }

        for attempt in 1..=MAX_INSERT_ATTEMPTS {
            let code = self.fresh_code().await?;

            let new_url = NewShortenedUrl {
                short_code: code,
                original_url: original_url.clone(),
                owner_id: cmd.owner_id.clone(),
                is_custom: false,
                expires_at,
            };

            match self.urls.create(new_url).await {
                Ok(url) => return Ok(url),
                Err(e) if e.is_conflict() => {
                    tracing::warn!(attempt, "Short code collision on insert, retrying");
                }
                Err(e) => return Err(e),
            }
        }

        Err(AppError::internal(
            "Failed to generate unique code",
            json!({ "reason": "Too many collisions" }),
        ))
    }

    /// Returns the original URL of an active, unexpired code.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on storage errors.
    pub async fn resolve(&self, code: &str) -> Result<Option<String>, AppError> {
        Ok(self.resolve_target(code).await?.map(|t| t.original_url))
    }

    /// Like [`Self::resolve`], also returning the expiry.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on storage errors.
    pub async fn resolve_target(&self, code: &str) -> Result<Option<ResolvedTarget>, AppError> {
        let target = self
            .urls
            .find_active_by_code(code)
            .await?
            .filter(|url| !url.is_expired())
            .map(|url| ResolvedTarget {
                original_url: url.original_url,
                expires_at: url.expires_at,
            });

        Ok(target)
    }

    /// Appends a click record and increments the click counter.
    ///
    /// Returns `Ok(false)` for unknown or inactive codes. Safe to retry: a
    /// failed call leaves neither the record nor the counter changed.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on storage errors.
    pub async fn record_click(
        &self,
        code: &str,
        metadata: ClickMetadata,
    ) -> Result<bool, AppError> {
        let Some(url) = self.urls.find_active_by_code(code).await? else {
            return Ok(false);
        };

        self.clicks
            .record(NewClick::from_metadata(url.id, metadata))
            .await?;

        Ok(true)
    }

    /// Returns a URL with its [`RECENT_CLICKS_LIMIT`] most recent clicks.
    ///
    /// # Errors
    ///
    /// - [`AppError::NotFound`] if the code is unknown or inactive
    /// - [`AppError::Unauthorized`] if the URL is owned by someone other
    ///   than `requester_id`
    /// - [`AppError::Internal`] on storage errors
    pub async fn get_statistics(
        &self,
        code: &str,
        requester_id: Option<&str>,
    ) -> Result<UrlStatistics, AppError> {
        let url = self
            .urls
            .find_active_by_code(code)
            .await?
            .ok_or_else(|| AppError::not_found("Short URL not found", json!({ "code": code })))?;

        if let Some(owner_id) = url.owner_id.as_deref()
            && requester_id != Some(owner_id)
        {
            return Err(AppError::unauthorized(
                "You are not authorized to view these statistics",
                json!({ "code": code }),
            ));
        }

        let recent_clicks = self
            .clicks
            .recent_for_url(url.id, RECENT_CLICKS_LIMIT)
            .await?;

        Ok(UrlStatistics { url, recent_clicks })
    }

    /// Lists an owner's URLs newest first with totals over all of them.
    ///
    /// # Errors
    ///
    /// - [`AppError::Validation`] if `page < 1` or `page_size` is outside
    ///   `1..=MAX_PAGE_SIZE`
    /// - [`AppError::Internal`] on storage errors
    pub async fn list_history(
        &self,
        owner_id: &str,
        page: i64,
        page_size: i64,
    ) -> Result<UrlHistory, AppError> {
        if page < 1 {
            return Err(AppError::bad_request(
                "Page must be at least 1",
                json!({ "page": page }),
            ));
        }

        if !(1..=MAX_PAGE_SIZE).contains(&page_size) {
            return Err(AppError::bad_request(
                format!("Page size must be between 1 and {MAX_PAGE_SIZE}"),
                json!({ "pageSize": page_size }),
            ));
        }

        let offset = (page - 1).checked_mul(page_size).ok_or_else(|| {
            AppError::bad_request("Page is out of range", json!({ "page": page }))
        })?;

        let urls = self
            .urls
            .list_by_owner(owner_id, offset, page_size)
            .await?;
        let totals = self.urls.owner_totals(owner_id).await?;

        Ok(UrlHistory {
            urls,
            page,
            page_size,
            total_urls: totals.total_urls,
            total_clicks: totals.total_clicks,
        })
    }

    /// Returns true iff no URL, active or not, uses `code`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on storage errors.
    pub async fn check_availability(&self, code: &str) -> Result<bool, AppError> {
        Ok(!self.urls.exists(code).await?)
    }

    /// Deletes an owned URL and its clicks.
    ///
    /// Returns `Ok(false)` when the code is unknown or owned by someone else.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on storage errors.
    pub async fn delete(&self, code: &str, owner_id: &str) -> Result<bool, AppError> {
        match self.owned_url(code, owner_id).await? {
            Some(url) => self.urls.delete(url.id).await,
            None => Ok(false),
        }
    }

    /// Updates the target URL and/or the code of an owned URL.
    ///
    /// Returns `Ok(None)` when the code is unknown or owned by someone else.
    /// A new custom code equal to the current one changes nothing.
    ///
    /// # Errors
    ///
    /// - [`AppError::Validation`] for a malformed URL or custom code
    /// - [`AppError::Conflict`] if the new custom code is taken
    /// - [`AppError::Internal`] on storage errors
    pub async fn update(
        &self,
        code: &str,
        owner_id: &str,
        cmd: UpdateCommand,
    ) -> Result<Option<ShortenedUrl>, AppError> {
        let Some(url) = self.owned_url(code, owner_id).await? else {
            return Ok(None);
        };

        let mut patch = UrlPatch::default();

        if let Some(new_url) = cmd.url.as_deref() {
            patch.original_url = Some(checked_url(new_url)?);
        }

        let new_code = cmd
            .new_code
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty() && *c != url.short_code);

        if cmd.regenerate {
            return self.apply_with_fresh_code(url, patch).await.map(Some);
        }

        if let Some(new_code) = new_code {
            validate_custom_code(&new_code)?;

            if self.urls.exists(&new_code).await? {
                return Err(code_taken(&new_code));
            }

            patch.short_code = Some(new_code.clone());
            patch.is_custom = Some(true);

            return match self.urls.update(url.id, patch).await {
                Ok(updated) => Ok(Some(updated)),
                Err(e) if e.is_conflict() => Err(code_taken(&new_code)),
                Err(AppError::NotFound { .. }) => Ok(None),
                Err(e) => Err(e),
            };
        }

        if patch.is_empty() {
            return Ok(Some(url));
        }

        match self.urls.update(url.id, patch).await {
            Ok(updated) => Ok(Some(updated)),
            Err(AppError::NotFound { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Builds the public short link for `code`.
    pub fn short_url(base_url: &str, code: &str) -> String {
        format!("{}/{}", base_url.trim_end_matches('/'), code)
    }

    /// Builds the public QR code link for `code`.
    pub fn qr_code_url(base_url: &str, code: &str) -> String {
        format!("{}/api/url/qr/{}", base_url.trim_end_matches('/'), code)
    }

    async fn owned_url(&self, code: &str, owner_id: &str) -> Result<Option<ShortenedUrl>, AppError> {
        Ok(self
            .urls
            .find_by_code(code)
            .await?
            .filter(|url| url.is_owned_by(owner_id)))
    }

    async fn fresh_code(&self) -> Result<String, AppError> {
        let urls = &self.urls;
        generate_unique_code(|candidate| async move { urls.exists(&candidate).await }).await
    }

    async fn apply_with_fresh_code(
        &self,
        url: ShortenedUrl,
        patch: UrlPatch,
    ) -> Result<ShortenedUrl, AppError> {
        for attempt in 1..=MAX_INSERT_ATTEMPTS {
            let code = self.fresh_code().await?;

            let patch = UrlPatch {
                short_code: Some(code),
                is_custom: Some(false),
                ..patch.clone()
            };

            match self.urls.update(url.id, patch).await {
                Ok(updated) => return Ok(updated),
                Err(e) if e.is_conflict() => {
                    tracing::warn!(attempt, "Short code collision on update, retrying");
                }
                Err(e) => return Err(e),
            }
        }

        Err(AppError::internal(
            "Failed to generate unique code",
            json!({ "reason": "Too many collisions", "code": url.short_code }),
        ))
    }
}

fn checked_url(input: &str) -> Result<String, AppError> {
    let trimmed = input.trim();
    validate_target_url(trimmed).map_err(|e| {
        AppError::bad_request("Invalid URL format", json!({ "reason": e.to_string() }))
    })?;
    Ok(trimmed.to_string())
}

fn expiry_from_days(days: Option<i64>) -> Result<Option<DateTime<Utc>>, AppError> {
    match days {
        None => Ok(None),
        Some(d) if (1..=MAX_EXPIRY_DAYS).contains(&d) => Ok(Some(Utc::now() + Duration::days(d))),
        Some(d) => Err(AppError::bad_request(
            format!("Expiry must be between 1 and {MAX_EXPIRY_DAYS} days"),
            json!({ "expiresInDays": d }),
        )),
    }
}

fn code_taken(code: &str) -> AppError {
    AppError::conflict("This custom code is already in use", json!({ "code": code }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::repositories::{MockClickRepository, MockUrlRepository, OwnerTotals};
    use crate::utils::code_generator::{CHARSET, DEFAULT_CODE_LENGTH};

    fn stored(new_url: NewShortenedUrl) -> ShortenedUrl {
        ShortenedUrl {
            id: 1,
            short_code: new_url.short_code,
            original_url: new_url.original_url,
            owner_id: new_url.owner_id,
            created_at: Utc::now(),
            click_count: 0,
            is_custom: new_url.is_custom,
            expires_at: new_url.expires_at,
            is_active: true,
        }
    }

    fn existing(code: &str, owner: Option<&str>) -> ShortenedUrl {
        ShortenedUrl {
            id: 7,
            short_code: code.to_string(),
            original_url: "https://example.com/original".to_string(),
            owner_id: owner.map(str::to_string),
            created_at: Utc::now(),
            click_count: 3,
            is_custom: false,
            expires_at: None,
            is_active: true,
        }
    }

    fn service(urls: MockUrlRepository, clicks: MockClickRepository) -> ShortenerService {
        ShortenerService::new(Arc::new(urls), Arc::new(clicks))
    }

    fn shorten_cmd(url: &str) -> ShortenCommand {
        ShortenCommand {
            url: url.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_shorten_anonymous_generates_code() {
        let mut urls = MockUrlRepository::new();
        urls.expect_exists().returning(|_| Ok(false));
        urls.expect_create()
            .withf(|n| !n.is_custom && n.owner_id.is_none())
            .times(1)
            .returning(|n| Ok(stored(n)));

        let svc = service(urls, MockClickRepository::new());
        let url = svc
            .shorten(shorten_cmd("https://www.example.com/very/long/url/path"))
            .await
            .unwrap();

        assert!(url.short_code.len() >= DEFAULT_CODE_LENGTH);
        assert!(url.short_code.bytes().all(|b| CHARSET.contains(&b)));
        assert_eq!(url.original_url, "https://www.example.com/very/long/url/path");

        let short = ShortenerService::short_url("https://localhost", &url.short_code);
        assert!(short.starts_with("https://localhost/"));
    }

    #[tokio::test]
    async fn test_shorten_trims_url() {
        let mut urls = MockUrlRepository::new();
        urls.expect_exists().returning(|_| Ok(false));
        urls.expect_create()
            .withf(|n| n.original_url == "https://example.com")
            .returning(|n| Ok(stored(n)));

        let svc = service(urls, MockClickRepository::new());
        assert!(svc.shorten(shorten_cmd("  https://example.com  ")).await.is_ok());
    }

    #[tokio::test]
    async fn test_shorten_invalid_url_fails_regardless_of_auth() {
        for owner in [None, Some("user123".to_string())] {
            let mut urls = MockUrlRepository::new();
            urls.expect_create().times(0);

            let svc = service(urls, MockClickRepository::new());
            let result = svc
                .shorten(ShortenCommand {
                    url: "not-a-valid-url".to_string(),
                    owner_id: owner,
                    custom_code: Some("my-link".to_string()),
                    expires_in_days: None,
                })
                .await;

            assert!(matches!(result, Err(AppError::Validation { .. })));
        }
    }

    #[tokio::test]
    async fn test_shorten_custom_code_requires_owner() {
        let mut urls = MockUrlRepository::new();
        urls.expect_exists().times(0);
        urls.expect_create().times(0);

        let svc = service(urls, MockClickRepository::new());
        let result = svc
            .shorten(ShortenCommand {
                url: "https://example.com".to_string(),
                custom_code: Some("my-link".to_string()),
                ..Default::default()
            })
            .await;

        assert!(matches!(result, Err(AppError::Unauthorized { .. })));
    }

    #[tokio::test]
    async fn test_shorten_invalid_custom_code_without_owner_is_unauthorized() {
        let svc = service(MockUrlRepository::new(), MockClickRepository::new());
        let result = svc
            .shorten(ShortenCommand {
                url: "https://example.com".to_string(),
                custom_code: Some("x".to_string()),
                ..Default::default()
            })
            .await;

        assert!(matches!(result, Err(AppError::Unauthorized { .. })));
    }

    #[tokio::test]
    async fn test_shorten_with_custom_code() {
        let mut urls = MockUrlRepository::new();
        urls.expect_exists()
            .withf(|code| code == "my-link")
            .times(1)
            .returning(|_| Ok(false));
        urls.expect_create()
            .withf(|n| n.short_code == "my-link" && n.is_custom)
            .times(1)
            .returning(|n| Ok(stored(n)));

        let svc = service(urls, MockClickRepository::new());
        let url = svc
            .shorten(ShortenCommand {
                url: "https://example.com".to_string(),
                owner_id: Some("user123".to_string()),
                custom_code: Some("my-link".to_string()),
                expires_in_days: None,
            })
            .await
            .unwrap();

        assert_eq!(url.short_code, "my-link");
        assert_eq!(url.owner_id.as_deref(), Some("user123"));
    }

    #[tokio::test]
    async fn test_shorten_empty_custom_code_is_ignored() {
        let mut urls = MockUrlRepository::new();
        urls.expect_exists().returning(|_| Ok(false));
        urls.expect_create()
            .withf(|n| !n.is_custom)
            .returning(|n| Ok(stored(n)));

        let svc = service(urls, MockClickRepository::new());
        let result = svc
            .shorten(ShortenCommand {
                url: "https://example.com".to_string(),
                custom_code: Some("   ".to_string()),
                ..Default::default()
            })
            .await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_shorten_custom_code_conflict() {
        let mut urls = MockUrlRepository::new();
        urls.expect_exists().returning(|_| Ok(true));
        urls.expect_create().times(0);

        let svc = service(urls, MockClickRepository::new());
        let result = svc
            .shorten(ShortenCommand {
                url: "https://example.com".to_string(),
                owner_id: Some("user123".to_string()),
                custom_code: Some("taken".to_string()),
                expires_in_days: None,
            })
            .await;

        assert!(matches!(result, Err(AppError::Conflict { .. })));
    }

    #[tokio::test]
    async fn test_shorten_custom_code_insert_race_is_conflict() {
        let mut urls = MockUrlRepository::new();
        urls.expect_exists().returning(|_| Ok(false));
        urls.expect_create()
            .times(1)
            .returning(|_| Err(AppError::conflict("Unique constraint violation", json!({}))));

        let svc = service(urls, MockClickRepository::new());
        let err = svc
            .shorten(ShortenCommand {
                url: "https://example.com".to_string(),
                owner_id: Some("user123".to_string()),
                custom_code: Some("raced".to_string()),
                expires_in_days: None,
            })
            .await
            .unwrap_err();

        assert!(err.is_conflict());
        assert_eq!(err.to_error_info().details["code"], "raced");
    }

    #[tokio::test]
    async fn test_shorten_retries_random_code_on_insert_conflict() {
        let mut urls = MockUrlRepository::new();
        let mut seq = mockall::Sequence::new();
        urls.expect_exists().returning(|_| Ok(false));
        urls.expect_create()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Err(AppError::conflict("Unique constraint violation", json!({}))));
        urls.expect_create()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|n| Ok(stored(n)));

        let svc = service(urls, MockClickRepository::new());
        assert!(svc.shorten(shorten_cmd("https://example.com")).await.is_ok());
    }

    #[tokio::test]
    async fn test_shorten_gives_up_after_repeated_conflicts() {
        let mut urls = MockUrlRepository::new();
        urls.expect_exists().returning(|_| Ok(false));
        urls.expect_create()
            .times(MAX_INSERT_ATTEMPTS)
            .returning(|_| Err(AppError::conflict("Unique constraint violation", json!({}))));

        let svc = service(urls, MockClickRepository::new());
        let result = svc.shorten(shorten_cmd("https://example.com")).await;

        assert!(matches!(result, Err(AppError::Internal { .. })));
    }

    #[tokio::test]
    async fn test_shorten_sets_expiry() {
        let mut urls = MockUrlRepository::new();
        urls.expect_exists().returning(|_| Ok(false));
        urls.expect_create().returning(|n| Ok(stored(n)));

        let svc = service(urls, MockClickRepository::new());
        let url = svc
            .shorten(ShortenCommand {
                url: "https://example.com".to_string(),
                expires_in_days: Some(7),
                ..Default::default()
            })
            .await
            .unwrap();

        let expires_at = url.expires_at.unwrap();
        let days = (expires_at - Utc::now()).num_hours();
        assert!((7 * 24 - 1..=7 * 24).contains(&days));
    }

    #[tokio::test]
    async fn test_shorten_rejects_out_of_range_expiry() {
        let svc = service(MockUrlRepository::new(), MockClickRepository::new());

        for days in [0, -1, MAX_EXPIRY_DAYS + 1] {
            let result = svc
                .shorten(ShortenCommand {
                    url: "https://example.com".to_string(),
                    expires_in_days: Some(days),
                    ..Default::default()
                })
                .await;
            assert!(matches!(result, Err(AppError::Validation { .. })), "{days}");
        }
    }

    #[tokio::test]
    async fn test_resolve_active_url() {
        let mut urls = MockUrlRepository::new();
        urls.expect_find_active_by_code()
            .returning(|code| Ok(Some(existing(code, None))));

        let svc = service(urls, MockClickRepository::new());
        assert_eq!(
            svc.resolve("abc123").await.unwrap().as_deref(),
            Some("https://example.com/original")
        );
    }

    #[tokio::test]
    async fn test_resolve_expired_is_none() {
        let mut urls = MockUrlRepository::new();
        urls.expect_find_active_by_code().returning(|code| {
            Ok(Some(ShortenedUrl {
                expires_at: Some(Utc::now() - Duration::minutes(1)),
                ..existing(code, None)
            }))
        });

        let svc = service(urls, MockClickRepository::new());
        assert!(svc.resolve("old").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_resolve_target_carries_expiry() {
        let expires_at = Utc::now() + Duration::hours(1);
        let mut urls = MockUrlRepository::new();
        urls.expect_find_active_by_code().returning(move |code| {
            Ok(Some(ShortenedUrl {
                expires_at: Some(expires_at),
                ..existing(code, None)
            }))
        });

        let svc = service(urls, MockClickRepository::new());
        let target = svc.resolve_target("abc").await.unwrap().unwrap();
        assert_eq!(target.expires_at, Some(expires_at));
    }

    #[tokio::test]
    async fn test_resolve_unknown_is_none() {
        let mut urls = MockUrlRepository::new();
        urls.expect_find_active_by_code().returning(|_| Ok(None));

        let svc = service(urls, MockClickRepository::new());
        assert!(svc.resolve("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_record_click_appends_through_click_repository() {
        let mut urls = MockUrlRepository::new();
        urls.expect_find_active_by_code()
            .returning(|code| Ok(Some(existing(code, None))));

        let mut clicks = MockClickRepository::new();
        clicks
            .expect_record()
            .withf(|c| c.shortened_url_id == 7 && c.user_agent.as_deref() == Some("Mozilla/5.0"))
            .times(1)
            .returning(|c| {
                Ok(ClickStatistic {
                    id: 1,
                    shortened_url_id: c.shortened_url_id,
                    clicked_at: Utc::now(),
                    ip_address: c.ip_address,
                    user_agent: c.user_agent,
                    referrer: c.referrer,
                    country: None,
                    city: None,
                })
            });

        let svc = service(urls, clicks);
        let metadata = ClickMetadata {
            user_agent: Some("Mozilla/5.0".to_string()),
            ..Default::default()
        };

        assert!(svc.record_click("abc123", metadata).await.unwrap());
    }

    #[tokio::test]
    async fn test_record_click_unknown_code() {
        let mut urls = MockUrlRepository::new();
        urls.expect_find_active_by_code().returning(|_| Ok(None));

        let mut clicks = MockClickRepository::new();
        clicks.expect_record().times(0);

        let svc = service(urls, clicks);
        assert!(!svc.record_click("missing", ClickMetadata::default()).await.unwrap());
    }

    #[tokio::test]
    async fn test_statistics_visible_to_owner() {
        let mut urls = MockUrlRepository::new();
        urls.expect_find_active_by_code()
            .returning(|code| Ok(Some(existing(code, Some("user123")))));

        let mut clicks = MockClickRepository::new();
        clicks
            .expect_recent_for_url()
            .withf(|id, limit| *id == 7 && *limit == RECENT_CLICKS_LIMIT)
            .returning(|_, _| Ok(vec![]));

        let svc = service(urls, clicks);
        let stats = svc.get_statistics("abc", Some("user123")).await.unwrap();
        assert_eq!(stats.url.click_count, 3);
    }

    #[tokio::test]
    async fn test_statistics_hidden_from_other_users() {
        for requester in [None, Some("intruder")] {
            let mut urls = MockUrlRepository::new();
            urls.expect_find_active_by_code()
                .returning(|code| Ok(Some(existing(code, Some("user123")))));

            let mut clicks = MockClickRepository::new();
            clicks.expect_recent_for_url().times(0);

            let svc = service(urls, clicks);
            let result = svc.get_statistics("abc", requester).await;
            assert!(matches!(result, Err(AppError::Unauthorized { .. })));
        }
    }

    #[tokio::test]
    async fn test_statistics_of_anonymous_url_are_public() {
        let mut urls = MockUrlRepository::new();
        urls.expect_find_active_by_code()
            .returning(|code| Ok(Some(existing(code, None))));

        let mut clicks = MockClickRepository::new();
        clicks.expect_recent_for_url().returning(|_, _| Ok(vec![]));

        let svc = service(urls, clicks);
        assert!(svc.get_statistics("abc", None).await.is_ok());
    }

    #[tokio::test]
    async fn test_statistics_unknown_code() {
        let mut urls = MockUrlRepository::new();
        urls.expect_find_active_by_code().returning(|_| Ok(None));

        let svc = service(urls, MockClickRepository::new());
        let result = svc.get_statistics("missing", Some("user123")).await;
        assert!(matches!(result, Err(AppError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_list_history_pages_and_totals() {
        let mut urls = MockUrlRepository::new();
        urls.expect_list_by_owner()
            .withf(|owner, offset, limit| owner == "user123" && *offset == 20 && *limit == 20)
            .times(1)
            .returning(|_, _, _| Ok(vec![existing("abc", Some("user123"))]));
        urls.expect_owner_totals().returning(|_| {
            Ok(OwnerTotals {
                total_urls: 21,
                total_clicks: 40,
            })
        });

        let svc = service(urls, MockClickRepository::new());
        let history = svc.list_history("user123", 2, 20).await.unwrap();

        assert_eq!(history.urls.len(), 1);
        assert_eq!(history.page, 2);
        assert_eq!(history.page_size, 20);
        assert_eq!(history.total_urls, 21);
        assert_eq!(history.total_clicks, 40);
    }

    #[tokio::test]
    async fn test_list_history_rejects_bad_paging() {
        let svc = service(MockUrlRepository::new(), MockClickRepository::new());

        for (page, size) in [(0, 20), (1, 0), (1, MAX_PAGE_SIZE + 1), (i64::MAX, 100)] {
            let result = svc.list_history("user123", page, size).await;
            assert!(
                matches!(result, Err(AppError::Validation { .. })),
                "page={page} size={size}"
            );
        }
    }

    #[tokio::test]
    async fn test_check_availability() {
        let mut urls = MockUrlRepository::new();
        urls.expect_exists().returning(|code| Ok(code == "taken"));

        let svc = service(urls, MockClickRepository::new());
        assert!(!svc.check_availability("taken").await.unwrap());
        assert!(svc.check_availability("free").await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_by_owner() {
        let mut urls = MockUrlRepository::new();
        urls.expect_find_by_code()
            .returning(|code| Ok(Some(existing(code, Some("user123")))));
        urls.expect_delete()
            .withf(|id| *id == 7)
            .times(1)
            .returning(|_| Ok(true));

        let svc = service(urls, MockClickRepository::new());
        assert!(svc.delete("abc", "user123").await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_by_non_owner_reports_failure() {
        let mut urls = MockUrlRepository::new();
        urls.expect_find_by_code()
            .returning(|code| Ok(Some(existing(code, Some("user123")))));
        urls.expect_delete().times(0);

        let svc = service(urls, MockClickRepository::new());
        assert!(!svc.delete("abc", "intruder").await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_anonymous_url_is_not_owned() {
        let mut urls = MockUrlRepository::new();
        urls.expect_find_by_code()
            .returning(|code| Ok(Some(existing(code, None))));
        urls.expect_delete().times(0);

        let svc = service(urls, MockClickRepository::new());
        assert!(!svc.delete("abc", "user123").await.unwrap());
    }

    #[tokio::test]
    async fn test_update_by_non_owner_is_none() {
        let mut urls = MockUrlRepository::new();
        urls.expect_find_by_code()
            .returning(|code| Ok(Some(existing(code, Some("user123")))));
        urls.expect_update().times(0);

        let svc = service(urls, MockClickRepository::new());
        let cmd = UpdateCommand {
            url: Some("https://new.example.com".to_string()),
            ..Default::default()
        };

        assert!(svc.update("abc", "intruder", cmd).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_url_only() {
        let mut urls = MockUrlRepository::new();
        urls.expect_find_by_code()
            .returning(|code| Ok(Some(existing(code, Some("user123")))));
        urls.expect_update()
            .withf(|id, patch| {
                *id == 7
                    && patch.original_url.as_deref() == Some("https://new.example.com")
                    && patch.short_code.is_none()
            })
            .times(1)
            .returning(|_, patch| {
                Ok(ShortenedUrl {
                    original_url: patch.original_url.unwrap(),
                    ..existing("abc", Some("user123"))
                })
            });

        let svc = service(urls, MockClickRepository::new());
        let cmd = UpdateCommand {
            url: Some("https://new.example.com".to_string()),
            ..Default::default()
        };

        let updated = svc.update("abc", "user123", cmd).await.unwrap().unwrap();
        assert_eq!(updated.original_url, "https://new.example.com");
        assert_eq!(updated.short_code, "abc");
    }

    #[tokio::test]
    async fn test_update_rejects_invalid_url() {
        let mut urls = MockUrlRepository::new();
        urls.expect_find_by_code()
            .returning(|code| Ok(Some(existing(code, Some("user123")))));
        urls.expect_update().times(0);

        let svc = service(urls, MockClickRepository::new());
        let cmd = UpdateCommand {
            url: Some("ftp://example.com".to_string()),
            ..Default::default()
        };

        let result = svc.update("abc", "user123", cmd).await;
        assert!(matches!(result, Err(AppError::Validation { .. })));
    }

    #[tokio::test]
    async fn test_update_with_nothing_changes_nothing() {
        let mut urls = MockUrlRepository::new();
        urls.expect_find_by_code()
            .returning(|code| Ok(Some(existing(code, Some("user123")))));
        urls.expect_update().times(0);

        let svc = service(urls, MockClickRepository::new());
        let updated = svc
            .update("abc", "user123", UpdateCommand::default())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.short_code, "abc");
    }

    #[tokio::test]
    async fn test_update_same_custom_code_is_noop() {
        let mut urls = MockUrlRepository::new();
        urls.expect_find_by_code()
            .returning(|code| Ok(Some(existing(code, Some("user123")))));
        urls.expect_exists().times(0);
        urls.expect_update().times(0);

        let svc = service(urls, MockClickRepository::new());
        let cmd = UpdateCommand {
            new_code: Some("my-link".to_string()),
            ..Default::default()
        };

        let updated = svc.update("my-link", "user123", cmd).await.unwrap().unwrap();
        assert_eq!(updated.short_code, "my-link");
    }

    #[tokio::test]
    async fn test_update_new_custom_code() {
        let mut urls = MockUrlRepository::new();
        urls.expect_find_by_code()
            .returning(|code| Ok(Some(existing(code, Some("user123")))));
        urls.expect_exists()
            .withf(|code| code == "fresh-link")
            .returning(|_| Ok(false));
        urls.expect_update()
            .withf(|_, patch| {
                patch.short_code.as_deref() == Some("fresh-link") && patch.is_custom == Some(true)
            })
            .times(1)
            .returning(|_, patch| {
                Ok(ShortenedUrl {
                    short_code: patch.short_code.unwrap(),
                    is_custom: true,
                    ..existing("abc", Some("user123"))
                })
            });

        let svc = service(urls, MockClickRepository::new());
        let cmd = UpdateCommand {
            new_code: Some("fresh-link".to_string()),
            ..Default::default()
        };

        let updated = svc.update("abc", "user123", cmd).await.unwrap().unwrap();
        assert_eq!(updated.short_code, "fresh-link");
        assert!(updated.is_custom);
    }

    #[tokio::test]
    async fn test_update_new_custom_code_conflict() {
        let mut urls = MockUrlRepository::new();
        urls.expect_find_by_code()
            .returning(|code| Ok(Some(existing(code, Some("user123")))));
        urls.expect_exists().returning(|_| Ok(true));
        urls.expect_update().times(0);

        let svc = service(urls, MockClickRepository::new());
        let cmd = UpdateCommand {
            new_code: Some("taken".to_string()),
            ..Default::default()
        };

        let result = svc.update("abc", "user123", cmd).await;
        assert!(matches!(result, Err(AppError::Conflict { .. })));
    }

    #[tokio::test]
    async fn test_update_invalid_custom_code() {
        let mut urls = MockUrlRepository::new();
        urls.expect_find_by_code()
            .returning(|code| Ok(Some(existing(code, Some("user123")))));
        urls.expect_update().times(0);

        let svc = service(urls, MockClickRepository::new());
        let cmd = UpdateCommand {
            new_code: Some("bad code!".to_string()),
            ..Default::default()
        };

        let result = svc.update("abc", "user123", cmd).await;
        assert!(matches!(result, Err(AppError::Validation { .. })));
    }

    #[tokio::test]
    async fn test_update_regenerate_wins_over_custom_code() {
        let mut urls = MockUrlRepository::new();
        urls.expect_find_by_code()
            .returning(|code| Ok(Some(existing(code, Some("user123")))));
        urls.expect_exists().returning(|_| Ok(false));
        urls.expect_update()
            .withf(|_, patch| {
                patch.is_custom == Some(false)
                    && patch
                        .short_code
                        .as_deref()
                        .is_some_and(|c| c != "ignored-code" && c.len() == DEFAULT_CODE_LENGTH)
            })
            .times(1)
            .returning(|_, patch| {
                Ok(ShortenedUrl {
                    short_code: patch.short_code.unwrap(),
                    ..existing("abc", Some("user123"))
                })
            });

        let svc = service(urls, MockClickRepository::new());
        let cmd = UpdateCommand {
            new_code: Some("ignored-code".to_string()),
            regenerate: true,
            ..Default::default()
        };

        let updated = svc.update("abc", "user123", cmd).await.unwrap().unwrap();
        assert_ne!(updated.short_code, "abc");
        assert!(!updated.is_custom);
    }

    #[test]
    fn test_public_links() {
        assert_eq!(
            ShortenerService::short_url("https://localhost/", "abc123"),
            "https://localhost/abc123"
        );
        assert_eq!(
            ShortenerService::qr_code_url("https://localhost", "abc123"),
            "https://localhost/api/url/qr/abc123"
        );
    }
}
