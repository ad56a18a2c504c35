//! Helpers shared by services and handlers.
//!
//! - [`code_generator`] - Short code generation and custom code validation
//! - [`url_validation`] - Target URL checks
//! - [`request_info`] - Public base URL, client IP and header values

pub mod code_generator;
pub mod request_info;
pub mod url_validation;
