//! Target URL validation.
//!
//! Only absolute `http`/`https` URLs are accepted. The stored value is the
//! caller's original string; parsing is used for validation only, so
//! characters the parser would silently strip (tabs, newlines) are rejected
//! up front and the stored value always fits a `Location` header.

use url::Url;

/// Maximum stored length of a target URL.
pub const MAX_URL_LENGTH: usize = 2048;

/// Errors that can occur while validating a target URL.
#[derive(Debug, thiserror::Error)]
pub enum UrlValidationError {
    #[error("URL must not be empty")]
    Empty,

    #[error("URL exceeds {MAX_URL_LENGTH} characters")]
    TooLong,

    #[error("URL must not contain control characters")]
    ControlCharacter,

    #[error("Invalid URL format: {0}")]
    InvalidFormat(String),

    #[error("Only HTTP and HTTPS protocols are allowed")]
    UnsupportedProtocol,

    #[error("URL must include a host")]
    MissingHost,
}

/// Validates that `input` is an absolute HTTP(S) URL.
///
/// Rejects relative references (`not-a-valid-url`), other schemes
/// (`javascript:`, `ftp:`, `file:`), host-less URLs, embedded control
/// characters and values longer than [`MAX_URL_LENGTH`] characters.
///
/// # Errors
///
/// Returns the matching [`UrlValidationError`] variant.
pub fn validate_target_url(input: &str) -> Result<Url, UrlValidationError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(UrlValidationError::Empty);
    }

    if trimmed.chars().count() > MAX_URL_LENGTH {
        return Err(UrlValidationError::TooLong);
    }

    if trimmed.chars().any(char::is_control) {
        return Err(UrlValidationError::ControlCharacter);
    }

    let url = Url::parse(trimmed).map_err(|e| UrlValidationError::InvalidFormat(e.to_string()))?;

    match url.scheme() {
        "http" | "https" => {}
        _ => return Err(UrlValidationError::UnsupportedProtocol),
    }

    if url.host_str().is_none_or(str::is_empty) {
        return Err(UrlValidationError::MissingHost);
    }

    Ok(url)
}
