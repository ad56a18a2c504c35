//! Repository implementations.
//!
//! - [`PgUrlRepository`] - Shortened URL storage in PostgreSQL
//! - [`PgClickRepository`] - Click records in PostgreSQL
//! - [`MemoryStore`] - Both repositories in process memory

pub mod memory_store;
pub mod pg_click_repository;
pub mod pg_url_repository;

pub use memory_store::MemoryStore;
pub use pg_click_repository::PgClickRepository;
pub use pg_url_repository::PgUrlRepository;
