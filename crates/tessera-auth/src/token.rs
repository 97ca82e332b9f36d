//! HS256 session token issuance and verification, handoff code
//! generation, and log redaction.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tessera_core::models::user::User;
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::error::AuthError;

/// Public user fields carried in a session token. Never includes the
/// password hash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserClaims {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mobile: Option<String>,
    pub first_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub middle_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
}

impl From<&User> for UserClaims {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            mobile: Some(user.mobile.clone()).filter(|m| !m.is_empty()),
            first_name: user.first_name.clone(),
            middle_name: user.middle_name.clone(),
            last_name: user.last_name.clone(),
        }
    }
}

/// Full claim set of a signed session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    #[serde(flatten)]
    pub user: UserClaims,
    /// Fingerprint of the device the token is bound to.
    pub fingerprint: String,
    pub iat: i64,
    pub exp: i64,
}

/// Sign a session token for `user` bound to `fingerprint`.
///
/// `iat`/`exp` are always freshly stamped.
pub fn issue_session_token(
    user: &UserClaims,
    fingerprint: &str,
    config: &AuthConfig,
) -> Result<String, AuthError> {
    let now = Utc::now().timestamp();
    let claims = SessionClaims {
        user: user.clone(),
        fingerprint: fingerprint.to_owned(),
        iat: now,
        exp: now + config.token_lifetime_secs as i64,
    };
    sign(&claims, config)
}

pub(crate) fn sign(claims: &SessionClaims, config: &AuthConfig) -> Result<String, AuthError> {
    let key = EncodingKey::from_secret(config.jwt_secret.as_bytes());
    jsonwebtoken::encode(&Header::new(Algorithm::HS256), claims, &key)
        .map_err(|e| AuthError::Crypto(format!("JWT encode: {e}")))
}

/// Decode and verify a session token: HS256 signature and expiry with
/// zero leeway.
pub fn decode_session_token(token: &str, config: &AuthConfig) -> Result<SessionClaims, AuthError> {
    let key = DecodingKey::from_secret(config.jwt_secret.as_bytes());

    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;
    validation.set_required_spec_claims(&["exp"]);

    jsonwebtoken::decode::<SessionClaims>(token, &key, &validation)
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            _ => AuthError::TokenInvalid(e.to_string()),
        })
}

/// Generate an opaque handoff code (32 random bytes, base64url without
/// padding).
pub fn generate_handoff_code() -> String {
    let mut rng = rand::rng();
    let bytes: [u8; 32] = rand::Rng::random(&mut rng);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Short SHA-256 digest of a secret-ish value, safe to put in logs.
pub fn redact(raw: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(raw.as_bytes());
    let mut digest = hex::encode(hasher.finalize());
    digest.truncate(12);
    digest
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> AuthConfig {
        AuthConfig {
            jwt_secret: "test-secret".into(),
            ..AuthConfig::default()
        }
    }

    fn alice() -> UserClaims {
        UserClaims {
            id: Uuid::new_v4(),
            username: "alice".into(),
            email: "alice@example.com".into(),
            mobile: Some("9876543210".into()),
            first_name: "Alice".into(),
            middle_name: None,
            last_name: Some("Smith".into()),
        }
    }

    #[test]
    fn token_roundtrip() {
        let config = test_config();
        let user = alice();
        let token = issue_session_token(&user, "F1", &config).unwrap();
        let claims = decode_session_token(&token, &config).unwrap();

        assert_eq!(claims.user, user);
        assert_eq!(claims.fingerprint, "F1");
        assert_eq!(claims.exp - claims.iat, 86_400);
    }

    #[test]
    fn claims_are_flat_and_omit_secrets() {
        let config = test_config();
        let token = issue_session_token(&alice(), "F1", &config).unwrap();
        let payload = token.split('.').nth(1).unwrap();
        let json: serde_json::Value =
            serde_json::from_slice(&URL_SAFE_NO_PAD.decode(payload).unwrap()).unwrap();

        assert_eq!(json["username"], "alice");
        assert_eq!(json["fingerprint"], "F1");
        assert!(json.get("password_hash").is_none());
        assert!(json.get("middle_name").is_none());
    }

    #[test]
    fn expired_token_is_rejected() {
        let config = test_config();
        let now = Utc::now().timestamp();
        let claims = SessionClaims {
            user: alice(),
            fingerprint: "F1".into(),
            iat: now - 100,
            exp: now - 1,
        };
        let token = sign(&claims, &config).unwrap();
        assert!(matches!(
            decode_session_token(&token, &config),
            Err(AuthError::TokenExpired)
        ));
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = issue_session_token(&alice(), "F1", &test_config()).unwrap();
        let other = AuthConfig {
            jwt_secret: "other-secret".into(),
            ..AuthConfig::default()
        };
        assert!(matches!(
            decode_session_token(&token, &other),
            Err(AuthError::TokenInvalid(_))
        ));
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(decode_session_token("not.a.jwt", &test_config()).is_err());
    }

    #[test]
    fn external_user_has_no_mobile_claim() {
        let user = User {
            id: Uuid::new_v4(),
            username: "gopher".into(),
            email: "g@example.com".into(),
            mobile: String::new(),
            first_name: "Go".into(),
            middle_name: None,
            last_name: None,
            password_hash: String::new(),
            profile_photo: None,
            created_at: Utc::now(),
        };
        assert_eq!(UserClaims::from(&user).mobile, None);
    }

    #[test]
    fn handoff_codes_are_url_safe_and_unique() {
        let a = generate_handoff_code();
        let b = generate_handoff_code();
        assert!(
            a.chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        );
        assert_eq!(a.len(), 43);
        assert_ne!(a, b);
    }

    #[test]
    fn redaction_is_stable_and_short() {
        assert_eq!(redact("F1"), redact("F1"));
        assert_ne!(redact("F1"), redact("F2"));
        assert_eq!(redact("F1").len(), 12);
    }
}
