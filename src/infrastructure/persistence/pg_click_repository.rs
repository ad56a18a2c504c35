//! PostgreSQL implementation of the click repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::sync::Arc;

use crate::domain::entities::{ClickStatistic, NewClick};
use crate::domain::repositories::ClickRepository;
use crate::error::AppError;

#[derive(sqlx::FromRow)]
struct ClickRow {
    id: i64,
    shortened_url_id: i64,
    clicked_at: DateTime<Utc>,
    ip_address: Option<String>,
    user_agent: Option<String>,
    referrer: Option<String>,
    country: Option<String>,
    city: Option<String>,
}

impl From<ClickRow> for ClickStatistic {
    fn from(r: ClickRow) -> Self {
        Self {
            id: r.id,
            shortened_url_id: r.shortened_url_id,
            clicked_at: r.clicked_at,
            ip_address: r.ip_address,
            user_agent: r.user_agent,
            referrer: r.referrer,
            country: r.country,
            city: r.city,
        }
    }
}

/// PostgreSQL repository for click records.
pub struct PgClickRepository {
    pool: Arc<PgPool>,
}

impl PgClickRepository {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ClickRepository for PgClickRepository {
    async fn record(&self, new_click: NewClick) -> Result<ClickStatistic, AppError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, ClickRow>(
            r#"
            INSERT INTO click_statistics
                (shortened_url_id, clicked_at, ip_address, user_agent, referrer)
            VALUES ($1, COALESCE($2, NOW()), $3, $4, $5)
            RETURNING id, shortened_url_id, clicked_at, ip_address, user_agent,
                      referrer, country, city
            "#,
        )
        .bind(new_click.shortened_url_id)
        .bind(new_click.clicked_at)
        .bind(&new_click.ip_address)
        .bind(&new_click.user_agent)
        .bind(&new_click.referrer)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("UPDATE shortened_urls SET click_count = click_count + 1 WHERE id = $1")
            .bind(row.shortened_url_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(row.into())
    }

    async fn recent_for_url(
        &self,
        shortened_url_id: i64,
        limit: i64,
    ) -> Result<Vec<ClickStatistic>, AppError> {
        let rows = sqlx::query_as::<_, ClickRow>(
            r#"
            SELECT id, shortened_url_id, clicked_at, ip_address, user_agent,
                   referrer, country, city
            FROM click_statistics
            WHERE shortened_url_id = $1
            ORDER BY clicked_at DESC, id DESC
            LIMIT $2
            "#,
        )
        .bind(shortened_url_id)
        .bind(limit)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}
