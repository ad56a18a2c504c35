//! Business logic services for the application layer.

pub mod auth_service;
pub mod qr_service;
pub mod shortener_service;

pub use auth_service::{AuthService, AuthUser};
pub use qr_service::QrService;
pub use shortener_service::{
    ResolvedTarget, ShortenCommand, ShortenerService, UpdateCommand, UrlHistory, UrlStatistics,
};
