//! PostgreSQL implementation of the URL repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::json;
use sqlx::PgPool;
use std::sync::Arc;

use crate::domain::entities::{NewShortenedUrl, ShortenedUrl, UrlPatch};
use crate::domain::repositories::{OwnerTotals, UrlRepository};
use crate::error::AppError;

const URL_COLUMNS: &str = "id, short_code, original_url, owner_id, created_at, click_count, \
                           is_custom, expires_at, is_active";

#[derive(sqlx::FromRow)]
struct UrlRow {
    id: i64,
    short_code: String,
    original_url: String,
    owner_id: Option<String>,
    created_at: DateTime<Utc>,
    click_count: i64,
    is_custom: bool,
    expires_at: Option<DateTime<Utc>>,
    is_active: bool,
}

impl From<UrlRow> for ShortenedUrl {
    fn from(r: UrlRow) -> Self {
        Self {
            id: r.id,
            short_code: r.short_code,
            original_url: r.original_url,
            owner_id: r.owner_id,
            created_at: r.created_at,
            click_count: r.click_count,
            is_custom: r.is_custom,
            expires_at: r.expires_at,
            is_active: r.is_active,
        }
    }
}

/// PostgreSQL repository for shortened URLs.
///
/// Code uniqueness is enforced by the `shortened_urls_short_code_key`
/// constraint; violations surface as [`AppError::Conflict`].
pub struct PgUrlRepository {
    pool: Arc<PgPool>,
}

impl PgUrlRepository {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UrlRepository for PgUrlRepository {
    async fn create(&self, new_url: NewShortenedUrl) -> Result<ShortenedUrl, AppError> {
        let sql = format!(
            r#"
            INSERT INTO shortened_urls (short_code, original_url, owner_id, is_custom, expires_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {URL_COLUMNS}
            "#
        );

        let row = sqlx::query_as::<_, UrlRow>(&sql)
            .bind(&new_url.short_code)
            .bind(&new_url.original_url)
            .bind(&new_url.owner_id)
            .bind(new_url.is_custom)
            .bind(new_url.expires_at)
            .fetch_one(self.pool.as_ref())
            .await?;

        Ok(row.into())
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<ShortenedUrl>, AppError> {
        let sql = format!("SELECT {URL_COLUMNS} FROM shortened_urls WHERE short_code = $1");

        let row = sqlx::query_as::<_, UrlRow>(&sql)
            .bind(code)
            .fetch_optional(self.pool.as_ref())
            .await?;

        Ok(row.map(Into::into))
    }

    async fn find_active_by_code(&self, code: &str) -> Result<Option<ShortenedUrl>, AppError> {
        let sql = format!(
            "SELECT {URL_COLUMNS} FROM shortened_urls WHERE short_code = $1 AND is_active"
        );

        let row = sqlx::query_as::<_, UrlRow>(&sql)
            .bind(code)
            .fetch_optional(self.pool.as_ref())
            .await?;

        Ok(row.map(Into::into))
    }

    async fn exists(&self, code: &str) -> Result<bool, AppError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM shortened_urls WHERE short_code = $1)",
        )
        .bind(code)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(exists)
    }

    async fn list_by_owner(
        &self,
        owner_id: &str,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<ShortenedUrl>, AppError> {
        let sql = format!(
            r#"
            SELECT {URL_COLUMNS}
            FROM shortened_urls
            WHERE owner_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2 OFFSET $3
            "#
        );

        let rows = sqlx::query_as::<_, UrlRow>(&sql)
            .bind(owner_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(self.pool.as_ref())
            .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn owner_totals(&self, owner_id: &str) -> Result<OwnerTotals, AppError> {
        let (total_urls, total_clicks) = sqlx::query_as::<_, (i64, i64)>(
            r#"
            SELECT COUNT(*), COALESCE(SUM(click_count), 0)::BIGINT
            FROM shortened_urls
            WHERE owner_id = $1
            "#,
        )
        .bind(owner_id)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(OwnerTotals {
            total_urls,
            total_clicks,
        })
    }

    async fn update(&self, id: i64, patch: UrlPatch) -> Result<ShortenedUrl, AppError> {
        let sql = format!(
            r#"
            UPDATE shortened_urls
            SET original_url = COALESCE($2, original_url),
                short_code   = COALESCE($3, short_code),
                is_custom    = COALESCE($4, is_custom)
            WHERE id = $1
            RETURNING {URL_COLUMNS}
            "#
        );

        let row = sqlx::query_as::<_, UrlRow>(&sql)
            .bind(id)
            .bind(&patch.original_url)
            .bind(&patch.short_code)
            .bind(patch.is_custom)
            .fetch_optional(self.pool.as_ref())
            .await?
            .ok_or_else(|| AppError::not_found("Short URL not found", json!({ "id": id })))?;

        Ok(row.into())
    }

    async fn delete(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM shortened_urls WHERE id = $1")
            .bind(id)
            .execute(self.pool.as_ref())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn set_active(&self, code: &str, active: bool) -> Result<bool, AppError> {
        let result = sqlx::query("UPDATE shortened_urls SET is_active = $2 WHERE short_code = $1")
            .bind(code)
            .bind(active)
            .execute(self.pool.as_ref())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn purge_expired(&self, before: DateTime<Utc>) -> Result<u64, AppError> {
        let result = sqlx::query(
            "DELETE FROM shortened_urls WHERE expires_at IS NOT NULL AND expires_at <= $1",
        )
        .bind(before)
        .execute(self.pool.as_ref())
        .await?;

        Ok(result.rows_affected())
    }

    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(self.pool.as_ref())
            .await?;

        Ok(())
    }
}
