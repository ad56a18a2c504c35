//! Repository trait definitions for the domain layer.
//!
//! Traits define the contract for data operations; implementations live in
//! `crate::infrastructure::persistence`. Mock implementations are generated
//! via `mockall` for service unit tests.
//!
//! # Available Repositories
//!
//! - [`UrlRepository`] - Shortened URL storage, lookups and aggregates
//! - [`ClickRepository`] - Click recording and recent-click queries

pub mod click_repository;
pub mod url_repository;

pub use click_repository::ClickRepository;
pub use url_repository::{OwnerTotals, UrlRepository};

#[cfg(test)]
pub use click_repository::MockClickRepository;
#[cfg(test)]
pub use url_repository::MockUrlRepository;
