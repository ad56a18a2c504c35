//! Short code generation and validation utilities.
//!
//! Random codes are drawn from the 62-symbol alphanumeric alphabet. Custom
//! codes chosen by users are validated against a small grammar and a list of
//! codes reserved for routing.

use std::future::Future;

use crate::error::AppError;
use rand::Rng;
use regex::Regex;
use serde_json::json;
use std::sync::LazyLock;

/// Alphabet used for random codes: `a-z`, `A-Z`, `0-9`.
pub const CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Length of a freshly generated code.
pub const DEFAULT_CODE_LENGTH: usize = 6;

/// Attempts at [`DEFAULT_CODE_LENGTH`] before switching to a longer code.
pub const MAX_ATTEMPTS_PER_LENGTH: usize = 10;

pub const CUSTOM_CODE_MIN_LENGTH: usize = 3;
pub const CUSTOM_CODE_MAX_LENGTH: usize = 20;

/// Codes that would shadow top-level routes.
pub const RESERVED_CODES: &[&str] = &["api", "health"];

static CUSTOM_CODE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9-]+$").expect("valid custom code regex"));

/// Generates a random code of `length` symbols from [`CHARSET`].
pub fn generate_code(length: usize) -> String {
    let mut rng = rand::rng();

    (0..length)
        .map(|_| {
            let idx = rng.random_range(0..CHARSET.len());
            CHARSET[idx] as char
        })
        .collect()
}

/// Returns true if `code` is reserved for system routes.
pub fn is_reserved(code: &str) -> bool {
    RESERVED_CODES
        .iter()
        .any(|reserved| reserved.eq_ignore_ascii_case(code))
}

/// Generates a code that `exists` reports as unused.
///
/// Tries [`MAX_ATTEMPTS_PER_LENGTH`] candidates of [`DEFAULT_CODE_LENGTH`]
/// symbols, then keeps trying with one extra symbol until a free code is
/// found. Reserved codes are skipped without consulting `exists`.
///
/// # Errors
///
/// Propagates any error returned by `exists`.
pub async fn generate_unique_code<F, Fut>(mut exists: F) -> Result<String, AppError>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<bool, AppError>>,
{
    let mut attempts = 0usize;

    loop {
        let length = if attempts < MAX_ATTEMPTS_PER_LENGTH {
            DEFAULT_CODE_LENGTH
        } else {
            DEFAULT_CODE_LENGTH + 1
        };
        attempts += 1;

        let candidate = generate_code(length);
        if is_reserved(&candidate) {
            continue;
        }

        if !exists(candidate.clone()).await? {
            if attempts > MAX_ATTEMPTS_PER_LENGTH {
                tracing::warn!(attempts, "Short code space congested, used longer code");
            }
            return Ok(candidate);
        }
    }
}

/// Validates a user-provided custom short code.
///
/// # Rules
///
/// - Length: 3-20 characters
/// - Allowed characters: ASCII letters, digits, hyphens
/// - Cannot be a reserved system code
///
/// # Errors
///
/// Returns [`AppError::Validation`] if any rule is violated.
pub fn validate_custom_code(code: &str) -> Result<(), AppError> {
    let length = code.chars().count();
    if !(CUSTOM_CODE_MIN_LENGTH..=CUSTOM_CODE_MAX_LENGTH).contains(&length) {
        return Err(AppError::bad_request(
            "Custom code must be 3-20 characters, alphanumeric and hyphens only",
            json!({ "provided_length": length }),
        ));
    }

    if !CUSTOM_CODE_REGEX.is_match(code) {
        return Err(AppError::bad_request(
            "Custom code must be 3-20 characters, alphanumeric and hyphens only",
            json!({ "code": code }),
        ));
    }

    if is_reserved(code) {
        return Err(AppError::bad_request(
            "This code is reserved",
            json!({ "code": code }),
        ));
    }

    Ok(())
}
