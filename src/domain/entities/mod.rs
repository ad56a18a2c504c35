//! Core domain entities.
//!
//! - [`ShortenedUrl`] - A short code mapped to an original URL
//! - [`ClickStatistic`] - A recorded redirect
//!
//! Creation inputs live in separate structs (`NewShortenedUrl`, `NewClick`),
//! partial updates in [`UrlPatch`].

pub mod click;
pub mod shortened_url;

pub use click::{ClickMetadata, ClickStatistic, NewClick};
pub use shortened_url::{NewShortenedUrl, ShortenedUrl, UrlPatch};
