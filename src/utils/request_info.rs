//! Request metadata extraction: public base URL, client IP, header values.

use crate::AppError;
use axum::http::{HeaderMap, HeaderName, header};
use std::net::{IpAddr, SocketAddr};

/// Maximum stored length of user-agent and referrer values.
pub const MAX_HEADER_VALUE_LENGTH: usize = 512;

/// Returns the base URL used to build public short links.
///
/// A configured base URL always wins. Otherwise the URL is derived from the
/// `Host` header (port kept). The scheme comes from `X-Forwarded-Proto` when
/// `behind_proxy` is set and defaults to `http`.
///
/// # Errors
///
/// Returns [`AppError::Validation`] if no base URL is configured and the
/// `Host` header is missing or not valid UTF-8.
///
/// # Examples
///
/// ```ignore
/// let mut headers = HeaderMap::new();
/// headers.insert(header::HOST, "sho.rt:8080".parse().unwrap());
///
/// let base = public_base_url(&headers, None, false).unwrap();
/// assert_eq!(base, "http://sho.rt:8080");
/// ```
pub fn public_base_url(
    headers: &HeaderMap,
    configured: Option<&str>,
    behind_proxy: bool,
) -> Result<String, AppError> {
    if let Some(base) = configured {
        return Ok(base.trim_end_matches('/').to_string());
    }

    let host = headers
        .get(header::HOST)
        .ok_or_else(|| AppError::bad_request("Missing Host header", serde_json::json!({})))?
        .to_str()
        .map_err(|_| AppError::bad_request("Invalid Host header", serde_json::json!({})))?;

    let scheme = if behind_proxy {
        header_str(headers, &HeaderName::from_static("x-forwarded-proto"))
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| v.eq_ignore_ascii_case("https") || v.eq_ignore_ascii_case("http"))
            .unwrap_or("http")
            .to_ascii_lowercase()
    } else {
        "http".to_string()
    };

    Ok(format!("{}://{}", scheme, host))
}

/// Returns the client IP address.
///
/// Behind a trusted proxy, the first `X-Forwarded-For` entry (or
/// `X-Real-IP`) is used when it parses as an IP address; otherwise the
/// socket peer address.
pub fn client_ip(headers: &HeaderMap, peer: SocketAddr, behind_proxy: bool) -> Option<String> {
    if behind_proxy {
        let forwarded = header_str(headers, &HeaderName::from_static("x-forwarded-for"))
            .and_then(|v| v.split(',').next())
            .and_then(parse_ip)
            .or_else(|| {
                header_str(headers, &HeaderName::from_static("x-real-ip")).and_then(parse_ip)
            });

        if let Some(ip) = forwarded {
            return Some(ip.to_string());
        }
    }

    Some(peer.ip().to_string())
}

fn parse_ip(value: &str) -> Option<IpAddr> {
    value.trim().parse().ok()
}

/// Returns a header value as `&str`, ignoring non-UTF-8 and empty values.
pub fn header_str<'a>(headers: &'a HeaderMap, name: &HeaderName) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
}

/// Truncates a header value to [`MAX_HEADER_VALUE_LENGTH`] characters.
pub fn truncate_header_value(value: &str) -> String {
    value.chars().take(MAX_HEADER_VALUE_LENGTH).collect()
}
