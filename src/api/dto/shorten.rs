//! DTOs for the shorten endpoint.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::application::services::ShortenerService;
use crate::application::services::shortener_service::MAX_EXPIRY_DAYS;
use crate::domain::entities::ShortenedUrl;

/// Request to shorten a URL.
///
/// The URL and custom code are validated by the service so that check order
/// (URL, authorization, code format, availability) stays the same for every
/// caller.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ShortenRequest {
    pub original_url: String,

    /// Custom code; authenticated callers only. Empty means none.
    #[serde(default)]
    pub custom_code: Option<String>,

    #[serde(default)]
    #[validate(range(min = 1, max = MAX_EXPIRY_DAYS, message = "expiresInDays must be between 1 and 3650"))]
    pub expires_in_days: Option<i64>,
}

/// A shortened URL as returned by shorten and update.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShortenResponse {
    pub short_code: String,
    pub short_url: String,
    pub original_url: String,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub expires_at: Option<DateTime<Utc>>,
    pub qr_code_url: String,
}

impl ShortenResponse {
    pub fn new(url: &ShortenedUrl, base_url: &str) -> Self {
        Self {
            short_code: url.short_code.clone(),
            short_url: ShortenerService::short_url(base_url, &url.short_code),
            original_url: url.original_url.clone(),
            created_at: url.created_at,
            expires_at: url.expires_at,
            qr_code_url: ShortenerService::qr_code_url(base_url, &url.short_code),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_uses_camel_case() {
        let json = r#"{"originalUrl":"https://example.com","customCode":"my-link","expiresInDays":7}"#;
        let req: ShortenRequest = serde_json::from_str(json).unwrap();

        assert_eq!(req.original_url, "https://example.com");
        assert_eq!(req.custom_code.as_deref(), Some("my-link"));
        assert_eq!(req.expires_in_days, Some(7));
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_request_optional_fields() {
        let req: ShortenRequest =
            serde_json::from_str(r#"{"originalUrl":"https://example.com"}"#).unwrap();

        assert!(req.custom_code.is_none());
        assert!(req.expires_in_days.is_none());
    }

    #[test]
    fn test_expiry_range_validation() {
        for days in [0, -5, 3651] {
            let req = ShortenRequest {
                original_url: "https://example.com".to_string(),
                custom_code: None,
                expires_in_days: Some(days),
            };
            assert!(req.validate().is_err(), "{days}");
        }
    }

    #[test]
    fn test_response_links() {
        let url = ShortenedUrl {
            id: 1,
            short_code: "abc123".to_string(),
            original_url: "https://www.example.com/very/long/url/path".to_string(),
            owner_id: None,
            created_at: Utc::now(),
            click_count: 0,
            is_custom: false,
            expires_at: None,
            is_active: true,
        };

        let response = ShortenResponse::new(&url, "https://localhost");
        assert_eq!(response.short_url, "https://localhost/abc123");
        assert_eq!(response.qr_code_url, "https://localhost/api/url/qr/abc123");

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["shortCode"], "abc123");
        assert!(json.get("expiresAt").is_none());
    }
}
