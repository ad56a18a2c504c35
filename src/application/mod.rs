//! Application layer services implementing business logic.
//!
//! Services consume repository traits and expose a small API to HTTP
//! handlers and the worker.
//!
//! # Available Services
//!
//! - [`services::shortener_service::ShortenerService`] - Shortening, resolution, analytics, ownership
//! - [`services::auth_service::AuthService`] - Bearer token identity extraction
//! - [`services::qr_service::QrService`] - QR code rendering

pub mod services;
