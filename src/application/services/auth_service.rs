//! Identity extraction from bearer JWTs issued by an external provider.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::Deserialize;

/// Longest accepted `sub` claim; matches the stored owner id column.
pub const MAX_USER_ID_LENGTH: usize = 100;

/// Authenticated caller identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    /// Provider user id (`sub` claim).
    pub id: String,
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Claims {
    sub: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    exp: Option<i64>,
}

/// Service turning bearer tokens into an optional [`AuthUser`].
///
/// With a shared secret, tokens are verified as HS256 with `exp` enforced and
/// audience ignored. Without one, the payload is decoded without signature
/// checks and only an expired `exp` is rejected; verification is then the
/// job of whatever sits in front of the service.
pub struct AuthService {
    key: Option<DecodingKey>,
    validation: Validation,
}

impl AuthService {
    /// Creates a new auth service, verifying signatures when `jwt_secret` is set.
    pub fn new(jwt_secret: Option<String>) -> Self {
        let key = jwt_secret
            .filter(|s| !s.is_empty())
            .map(|s| DecodingKey::from_secret(s.as_bytes()));

        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_aud = false;

        Self { key, validation }
    }

    /// Returns true when signatures are verified.
    pub fn verifies_signatures(&self) -> bool {
        self.key.is_some()
    }

    /// Extracts the caller identity, or `None` for invalid tokens.
    pub fn identify(&self, token: &str) -> Option<AuthUser> {
        let claims = match &self.key {
            Some(key) => match decode::<Claims>(token, key, &self.validation) {
                Ok(data) => data.claims,
                Err(e) => {
                    tracing::debug!(error = %e, "Rejected bearer token");
                    return None;
                }
            },
            None => decode_unverified(token)?,
        };

        if claims.sub.trim().is_empty() {
            return None;
        }

        if claims.sub.chars().count() > MAX_USER_ID_LENGTH {
            tracing::debug!("Rejected bearer token with oversized subject");
            return None;
        }

        Some(AuthUser {
            id: claims.sub,
            email: claims.email.filter(|e| !e.is_empty()),
        })
    }
}

fn decode_unverified(token: &str) -> Option<Claims> {
    let mut parts = token.split('.');
    let (_header, payload, _signature) = (parts.next()?, parts.next()?, parts.next()?);
    if parts.next().is_some() {
        return None;
    }

    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .ok()?;
    let claims: Claims = serde_json::from_slice(&bytes).ok()?;

    if claims.exp.is_some_and(|exp| exp <= Utc::now().timestamp()) {
        tracing::debug!("Rejected expired bearer token");
        return None;
    }

    Some(claims)
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{EncodingKey, Header, encode};
    use serde_json::json;

    const SECRET: &str = "test_secret_key_32_bytes_long!!";

    fn token(secret: &str, claims: serde_json::Value) -> String {
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn valid_claims() -> serde_json::Value {
        json!({
            "sub": "user123",
            "email": "user@example.com",
            "aud": "authenticated",
            "exp": Utc::now().timestamp() + 3600,
        })
    }

    #[test]
    fn test_verified_token_yields_identity() {
        let service = AuthService::new(Some(SECRET.to_string()));
        let user = service.identify(&token(SECRET, valid_claims())).unwrap();

        assert!(service.verifies_signatures());
        assert_eq!(user.id, "user123");
        assert_eq!(user.email.as_deref(), Some("user@example.com"));
    }

    #[test]
    fn test_wrong_signature_is_anonymous() {
        let service = AuthService::new(Some(SECRET.to_string()));
        assert!(service.identify(&token("other-secret", valid_claims())).is_none());
    }

    #[test]
    fn test_expired_verified_token_is_anonymous() {
        let service = AuthService::new(Some(SECRET.to_string()));
        let claims = json!({ "sub": "user123", "exp": Utc::now().timestamp() - 3600 });

        assert!(service.identify(&token(SECRET, claims)).is_none());
    }

    #[test]
    fn test_unverified_mode_decodes_payload() {
        let service = AuthService::new(None);
        let user = service
            .identify(&token("whatever", valid_claims()))
            .unwrap();

        assert!(!service.verifies_signatures());
        assert_eq!(user.id, "user123");
    }

    #[test]
    fn test_unverified_mode_rejects_expired() {
        let service = AuthService::new(None);
        let claims = json!({ "sub": "user123", "exp": Utc::now().timestamp() - 10 });

        assert!(service.identify(&token("whatever", claims)).is_none());
    }

    #[test]
    fn test_unverified_mode_without_exp() {
        let service = AuthService::new(None);
        let user = service
            .identify(&token("whatever", json!({ "sub": "user123" })))
            .unwrap();

        assert_eq!(user.id, "user123");
        assert!(user.email.is_none());
    }

    #[test]
    fn test_garbage_tokens_are_anonymous() {
        let service = AuthService::new(None);

        for raw in ["", "abc", "a.b", "a.b.c.d", "x.!!!.y", "e30.e30.sig"] {
            assert!(service.identify(raw).is_none(), "{raw}");
        }
    }

    #[test]
    fn test_empty_subject_is_anonymous() {
        let service = AuthService::new(None);
        assert!(service.identify(&token("s", json!({ "sub": "" }))).is_none());
    }

    #[test]
    fn test_empty_secret_means_unverified() {
        let service = AuthService::new(Some(String::new()));
        assert!(!service.verifies_signatures());
    }

    #[test]
    fn test_oversized_subject_is_anonymous() {
        let service = AuthService::new(Some(SECRET.to_string()));

        let longest = "u".repeat(MAX_USER_ID_LENGTH);
        let user = service
            .identify(&token(SECRET, json!({ "sub": longest, "exp": Utc::now().timestamp() + 60 })))
            .unwrap();
        assert_eq!(user.id.len(), MAX_USER_ID_LENGTH);

        let oversized = "u".repeat(MAX_USER_ID_LENGTH + 1);
        let claims = json!({ "sub": oversized, "exp": Utc::now().timestamp() + 60 });
        assert!(service.identify(&token(SECRET, claims)).is_none());
    }
}
