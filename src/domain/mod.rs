//! Domain layer containing business entities and repository contracts.
//!
//! - [`entities`] - Core business data structures
//! - [`repositories`] - Data access trait definitions
//! - [`click_event`] - Click tracking event model
//! - [`click_worker`] - Asynchronous click processing worker
//!
//! # Click Processing Flow
//!
//! 1. The redirect handler resolves the code and answers with `302 Found`
//! 2. A [`click_event::ClickEvent`] is offered to a bounded channel (never awaited)
//! 3. [`click_worker::run_click_worker`] records it with retry logic
//! 4. The click counter and click row are persisted via the repositories

pub mod click_event;
pub mod click_worker;
pub mod entities;
pub mod repositories;
