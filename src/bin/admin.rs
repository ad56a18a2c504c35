//! CLI administration tool for linkshort.
//!
//! Inspects and moderates shortened URLs, shows statistics, and performs
//! database checks without going through the HTTP API.
//!
//! # Usage
//!
//! ```bash
//! # Show a URL
//! cargo run --bin admin -- url show abc123
//!
//! # Take a URL out of service (its code stays reserved)
//! cargo run --bin admin -- url deactivate abc123
//!
//! # Delete expired URLs
//! cargo run --bin admin -- url purge-expired --yes
//!
//! # View statistics
//! cargo run --bin admin -- stats
//!
//! # Check database connection
//! cargo run --bin admin -- db check
//! ```
//!
//! # Environment Variables
//!
//! - `DATABASE_URL` or `DB_*` components (required)
//! - `REDIS_URL` or `REDIS_*` components (optional): cached redirects of
//!   deactivated URLs are dropped immediately

use linkshort::config::Config;
use linkshort::domain::entities::ShortenedUrl;
use linkshort::domain::repositories::UrlRepository;
use linkshort::infrastructure::cache::{CacheService, RedisCache};
use linkshort::infrastructure::persistence::PgUrlRepository;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use colored::*;
use dialoguer::Confirm;
use sqlx::PgPool;
use std::sync::Arc;

/// CLI tool for managing linkshort.
#[derive(Parser)]
#[command(name = "admin")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Top-level command groups.
#[derive(Subcommand)]
enum Commands {
    /// Inspect and moderate shortened URLs
    Url {
        #[command(subcommand)]
        action: UrlAction,
    },

    /// Show statistics
    Stats,

    /// Database operations
    Db {
        #[command(subcommand)]
        action: DbAction,
    },
}

/// URL management subcommands.
#[derive(Subcommand)]
enum UrlAction {
    /// Show a shortened URL
    Show {
        /// Short code
        code: String,
    },

    /// Stop redirecting a code; the code stays reserved
    Deactivate {
        /// Short code
        code: String,
    },

    /// Resume redirecting a deactivated code
    Activate {
        /// Short code
        code: String,
    },

    /// Delete every expired URL together with its clicks
    PurgeExpired {
        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },
}

/// Database operation subcommands.
#[derive(Subcommand)]
enum DbAction {
    /// Check database connection
    Check,

    /// Show database info
    Info,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let database_url = Config::load_database_url()?;

    let pool = PgPool::connect(&database_url)
        .await
        .context("Failed to connect to database")?;

    match cli.command {
        Commands::Url { action } => handle_url_action(action, &pool).await?,
        Commands::Stats => handle_stats(&pool).await?,
        Commands::Db { action } => handle_db_action(action, &pool).await?,
    }

    Ok(())
}

/// Dispatches URL management commands.
async fn handle_url_action(action: UrlAction, pool: &PgPool) -> Result<()> {
    let repo = PgUrlRepository::new(Arc::new(pool.clone()));

    match action {
        UrlAction::Show { code } => show_url(&repo, &code).await?,
        UrlAction::Deactivate { code } => set_active(&repo, &code, false).await?,
        UrlAction::Activate { code } => set_active(&repo, &code, true).await?,
        UrlAction::PurgeExpired { yes } => purge_expired(&repo, pool, yes).await?,
    }

    Ok(())
}

/// Prints every stored field of a URL.
async fn show_url(repo: &PgUrlRepository, code: &str) -> Result<()> {
    let url = repo
        .find_by_code(code)
        .await
        .map_err(|e| anyhow::anyhow!("Database error: {}", e))?
        .with_context(|| format!("No URL with code '{code}'"))?;

    print_url(&url);
    Ok(())
}

fn print_url(url: &ShortenedUrl) {
    let status = if !url.is_active {
        "INACTIVE".red()
    } else if url.is_expired() {
        "EXPIRED".yellow()
    } else {
        "ACTIVE".green()
    };

    println!("{}", "🔗 Shortened URL".bright_blue().bold());
    println!();
    println!("  Code:     {}", url.short_code.cyan().bold());
    println!("  Target:   {}", url.original_url.bright_white());
    println!(
        "  Owner:    {}",
        url.owner_id.as_deref().unwrap_or("anonymous").bright_black()
    );
    println!("  Custom:   {}", url.is_custom);
    println!(
        "  Created:  {}",
        url.created_at.format("%Y-%m-%d %H:%M").to_string().bright_black()
    );
    println!(
        "  Expires:  {}",
        url.expires_at
            .map(|e| e.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "never".to_string())
            .bright_black()
    );
    println!("  Clicks:   {}", url.click_count.to_string().bright_green());
    println!("  Status:   {}", status);
    println!();
}

/// Flips `is_active` and drops any cached redirect for the code.
async fn set_active(repo: &PgUrlRepository, code: &str, active: bool) -> Result<()> {
    let found = repo
        .set_active(code, active)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to update URL: {}", e))?;

    if !found {
        println!("{}", format!("❌ No URL with code '{code}'").red());
        return Ok(());
    }

    if !active {
        invalidate_cached(code).await;
    }

    let verb = if active { "activated" } else { "deactivated" };
    println!("{}", format!("✅ URL {code} {verb}").green().bold());

    Ok(())
}

async fn invalidate_cached(code: &str) {
    let Some(redis_url) = Config::load_redis_url() else {
        return;
    };

    match RedisCache::connect(&redis_url).await {
        Ok(cache) => cache.invalidate(code).await,
        Err(e) => println!(
            "{}",
            format!("⚠️  Could not reach Redis ({e}); cached redirects expire on their own")
                .yellow()
        ),
    }
}

/// Deletes expired URLs after confirmation.
async fn purge_expired(repo: &PgUrlRepository, pool: &PgPool, skip_confirm: bool) -> Result<()> {
    println!("{}", "🧹 Purge expired URLs".bright_blue().bold());
    println!();

    let now = Utc::now();

    let expired: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM shortened_urls WHERE expires_at IS NOT NULL AND expires_at <= $1",
    )
    .bind(now)
    .fetch_one(pool)
    .await?;

    if expired == 0 {
        println!("{}", "  Nothing to purge".yellow());
        return Ok(());
    }

    println!(
        "  Expired URLs: {}",
        expired.to_string().bright_white().bold()
    );
    println!();

    if !skip_confirm {
        let confirmed = Confirm::new()
            .with_prompt("Delete them and their click history?")
            .default(false)
            .interact()?;

        if !confirmed {
            println!("{}", "❌ Cancelled".red());
            return Ok(());
        }
    }

    let deleted = repo
        .purge_expired(now)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to purge URLs: {}", e))?;

    println!();
    println!(
        "{}",
        format!("✅ Deleted {deleted} expired URLs").green().bold()
    );
    println!();

    Ok(())
}

/// Displays system statistics.
///
/// Shows:
/// - Total number of URLs, and how many are inactive or expired
/// - Total number of recorded clicks
/// - Number of distinct owners
async fn handle_stats(pool: &PgPool) -> Result<()> {
    println!("{}", "📊 Statistics".bright_blue().bold());
    println!();

    let urls_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM shortened_urls")
        .fetch_one(pool)
        .await?;

    let inactive_count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM shortened_urls WHERE NOT is_active")
            .fetch_one(pool)
            .await?;

    let expired_count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM shortened_urls WHERE expires_at IS NOT NULL AND expires_at <= NOW()",
    )
    .fetch_one(pool)
    .await?;

    let clicks_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM click_statistics")
        .fetch_one(pool)
        .await?;

    let owners_count: i64 =
        sqlx::query_scalar("SELECT COUNT(DISTINCT owner_id) FROM shortened_urls")
            .fetch_one(pool)
            .await?;

    println!(
        "  URLs:      {}",
        urls_count.to_string().bright_green().bold()
    );
    println!("  Inactive:  {}", inactive_count.to_string().bright_black());
    println!("  Expired:   {}", expired_count.to_string().bright_black());
    println!(
        "  Clicks:    {}",
        clicks_count.to_string().bright_green().bold()
    );
    println!(
        "  Owners:    {}",
        owners_count.to_string().bright_green().bold()
    );
    println!();

    Ok(())
}

/// Handles database diagnostic commands.
async fn handle_db_action(action: DbAction, pool: &PgPool) -> Result<()> {
    match action {
        DbAction::Check => {
            println!("{}", "🔍 Checking database connection...".bright_blue());

            sqlx::query("SELECT 1").fetch_one(pool).await?;

            println!("{}", "✅ Database connection OK".green().bold());
        }
        DbAction::Info => {
            println!("{}", "ℹ️  Database Information".bright_blue().bold());
            println!();

            let version: String = sqlx::query_scalar("SELECT version()")
                .fetch_one(pool)
                .await?;

            let migrations: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations")
                .fetch_one(pool)
                .await
                .unwrap_or(0);

            println!("  PostgreSQL: {}", version.bright_white());
            println!("  Migrations: {}", migrations.to_string().bright_white());
            println!();
        }
    }

    Ok(())
}
