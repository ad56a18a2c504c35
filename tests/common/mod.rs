#![allow(dead_code)]

use axum::extract::connect_info::MockConnectInfo;
use axum_test::TestServer;
use chrono::{DateTime, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use linkshort::config::Config;
use linkshort::domain::click_event::ClickEvent;
use linkshort::domain::entities::{NewShortenedUrl, ShortenedUrl};
use linkshort::domain::repositories::UrlRepository;
use linkshort::infrastructure::cache::NullCache;
use linkshort::routes::build_router;
use linkshort::server::{Repositories, build_state};
use linkshort::state::AppState;
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::mpsc;

pub const BASE_URL: &str = "https://sho.rt";
pub const JWT_SECRET: &str = "test-jwt-secret";
pub const PEER: &str = "203.0.113.9:40000";

/// In-process server over the in-memory store.
pub struct TestApp {
    pub server: TestServer,
    pub state: AppState,
    pub repos: Repositories,
    pub clicks: mpsc::Receiver<ClickEvent>,
}

pub fn test_config() -> Config {
    Config {
        public_base_url: Some(BASE_URL.to_string()),
        jwt_secret: Some(JWT_SECRET.to_string()),
        ..Config::default()
    }
}

pub fn spawn_app() -> TestApp {
    spawn_app_with(test_config(), 100)
}

pub fn spawn_app_with(config: Config, queue_capacity: usize) -> TestApp {
    let repos = Repositories::in_memory();
    let (tx, rx) = mpsc::channel(queue_capacity);
    let state = build_state(&config, repos.clone(), Arc::new(NullCache::new()), tx);

    let peer: SocketAddr = PEER.parse().unwrap();
    let app = build_router(state.clone()).layer(MockConnectInfo(peer));

    TestApp {
        server: TestServer::new(app).unwrap(),
        state,
        repos,
        clicks: rx,
    }
}

#[derive(Serialize)]
struct Claims<'a> {
    sub: &'a str,
    email: String,
    exp: i64,
}

/// Signed HS256 token for `user_id`, valid for an hour.
pub fn token_for(user_id: &str) -> String {
    let claims = Claims {
        sub: user_id,
        email: format!("{user_id}@example.com"),
        exp: Utc::now().timestamp() + 3600,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .unwrap()
}

/// `Authorization` header value for `user_id`.
pub fn bearer(user_id: &str) -> String {
    format!("Bearer {}", token_for(user_id))
}

pub async fn seed_url(
    repos: &Repositories,
    code: &str,
    url: &str,
    owner: Option<&str>,
    expires_at: Option<DateTime<Utc>>,
) -> ShortenedUrl {
    repos
        .urls
        .create(NewShortenedUrl {
            short_code: code.to_string(),
            original_url: url.to_string(),
            owner_id: owner.map(str::to_string),
            is_custom: true,
            expires_at,
        })
        .await
        .unwrap()
}
