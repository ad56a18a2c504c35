//! Data Transfer Objects for API requests and responses.
//!
//! JSON field names are camelCase. Input validation uses `validator` where a
//! rule belongs to the wire format; domain rules live in the services.

pub mod health;
pub mod history;
pub mod qr;
pub mod shorten;
pub mod stats;
pub mod update_url;
