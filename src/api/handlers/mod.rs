//! HTTP request handlers for API endpoints.
//!
//! Each handler module corresponds to a logical grouping of endpoints.

pub mod health;
pub mod qr;
pub mod redirect;
pub mod shorten;
pub mod urls;

pub use health::{health_handler, ready_handler};
pub use qr::qr_handler;
pub use redirect::redirect_handler;
pub use shorten::shorten_handler;
pub use urls::{check_handler, delete_handler, history_handler, stats_handler, update_handler};
