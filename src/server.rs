//! HTTP server initialization and runtime setup.
//!
//! Handles storage and cache setup, worker spawning, and the Axum server
//! lifecycle including graceful shutdown.

use crate::application::services::{AuthService, QrService, ShortenerService};
use crate::config::{Config, StorageBackend};
use crate::domain::click_event::ClickEvent;
use crate::domain::click_worker::run_click_worker;
use crate::domain::repositories::{ClickRepository, UrlRepository};
use crate::infrastructure::cache::{CacheService, NullCache, RedisCache};
use crate::infrastructure::persistence::{MemoryStore, PgClickRepository, PgUrlRepository};
use crate::routes::app_router;
use crate::state::AppState;

use anyhow::{Context, Result};
use axum::ServiceExt;
use axum::extract::Request;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::AtomicU64;
use std::time::Duration;
use tokio::sync::mpsc;

/// Time granted to the click worker to drain after the server stops.
const WORKER_DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

/// Repository handles of the selected storage backend.
#[derive(Clone)]
pub struct Repositories {
    pub urls: Arc<dyn UrlRepository>,
    pub clicks: Arc<dyn ClickRepository>,
}

impl Repositories {
    /// Both repositories backed by one in-memory store.
    pub fn in_memory() -> Self {
        let store = Arc::new(MemoryStore::new());
        Self {
            urls: store.clone(),
            clicks: store,
        }
    }

    /// PostgreSQL repositories sharing one pool.
    pub fn postgres(pool: PgPool) -> Self {
        let pool = Arc::new(pool);
        Self {
            urls: Arc::new(PgUrlRepository::new(pool.clone())),
            clicks: Arc::new(PgClickRepository::new(pool)),
        }
    }
}

/// Assembles the shared application state.
pub fn build_state(
    config: &Config,
    repos: Repositories,
    cache: Arc<dyn CacheService>,
    click_tx: mpsc::Sender<ClickEvent>,
) -> AppState {
    AppState {
        shortener: Arc::new(ShortenerService::new(repos.urls.clone(), repos.clicks)),
        auth_service: Arc::new(AuthService::new(config.jwt_secret.clone())),
        qr_service: Arc::new(QrService::new()),
        store: repos.urls,
        cache,
        click_tx,
        base_url: config.public_base_url.clone(),
        behind_proxy: config.behind_proxy,
        cache_ttl: Duration::from_secs(config.cache_ttl_seconds),
        cache_epoch: Arc::new(AtomicU64::new(0)),
    }
}

/// Runs the HTTP server with the given configuration.
///
/// Initializes:
/// - Storage (PostgreSQL pool with migrations, or the in-memory store)
/// - Redis cache (or NullCache fallback)
/// - Background click worker
/// - Axum HTTP server
///
/// On Ctrl+C the server stops accepting connections, in-flight requests
/// finish, and queued clicks are drained before returning.
///
/// # Errors
///
/// Returns an error if:
/// - Database connection or migration fails
/// - Server bind fails
/// - Server runtime error occurs
pub async fn run(config: Config) -> Result<()> {
    let repos = match config.storage_backend {
        StorageBackend::Postgres => Repositories::postgres(connect_database(&config).await?),
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage; data is lost on restart");
            Repositories::in_memory()
        }
    };

    let cache = connect_cache(&config).await;

    let (click_tx, click_rx) = mpsc::channel(config.click_queue_capacity);
    let state = build_state(&config, repos, cache, click_tx);

    if !state.auth_service.verifies_signatures() {
        tracing::warn!("JWT_SECRET is not set; bearer token signatures are not verified");
    }

    let worker = tokio::spawn(run_click_worker(
        click_rx,
        state.shortener.clone(),
        config.click_worker_concurrency,
    ));
    tracing::info!(
        concurrency = config.click_worker_concurrency,
        "Click worker started"
    );

    let app = app_router(state, config.behind_proxy);

    let addr: SocketAddr = config
        .listen_addr
        .parse()
        .with_context(|| format!("Invalid listen address '{}'", config.listen_addr))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!("Listening on http://{addr}");

    axum::serve(
        listener,
        ServiceExt::<Request>::into_make_service_with_connect_info::<SocketAddr>(app),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    // The router and every click sender are gone; the worker drains and exits.
    match tokio::time::timeout(WORKER_DRAIN_TIMEOUT, worker).await {
        Ok(Ok(())) => tracing::info!("Click worker drained"),
        Ok(Err(e)) => tracing::error!(error = %e, "Click worker panicked"),
        Err(_) => tracing::warn!(
            "Click worker did not drain within {}s, pending clicks are lost",
            WORKER_DRAIN_TIMEOUT.as_secs()
        ),
    }

    Ok(())
}

async fn connect_database(config: &Config) -> Result<PgPool> {
    let url = config
        .database_url
        .as_deref()
        .context("DATABASE_URL is required for the postgres storage backend")?;

    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(config.db_connect_timeout))
        .idle_timeout(Duration::from_secs(config.db_idle_timeout))
        .max_lifetime(Duration::from_secs(config.db_max_lifetime))
        .connect(url)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("Connected to database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")?;
    tracing::info!("Migrations applied");

    Ok(pool)
}

async fn connect_cache(config: &Config) -> Arc<dyn CacheService> {
    let Some(redis_url) = config.redis_url.as_deref() else {
        tracing::info!("Cache disabled (NullCache)");
        return Arc::new(NullCache::new());
    };

    match RedisCache::connect(redis_url).await {
        Ok(redis) => {
            tracing::info!("Cache enabled (Redis)");
            Arc::new(redis)
        }
        Err(e) => {
            tracing::warn!("Failed to connect to Redis: {}. Using NullCache.", e);
            Arc::new(NullCache::new())
        }
    }
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Shutdown signal received"),
        Err(e) => tracing::warn!(
            "Failed to listen for Ctrl+C: {}. Shutting down anyway.",
            e
        ),
    }
}
