use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::models::UserProfile;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub id: String,
    pub username: String,
    pub iat: i64,
    pub exp: i64,
}

/// HS256 signing and verification keys plus the token lifetime.
#[derive(Clone)]
pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl TokenKeys {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }

    pub fn issue(&self, user: &UserProfile) -> Result<String, AppError> {
        let iat = Utc::now().timestamp();
        let exp = i64::try_from(self.ttl.as_secs())
            .ok()
            .and_then(|ttl| iat.checked_add(ttl))
            .ok_or_else(|| AppError::Internal("token lifetime out of range".to_string()))?;
        let claims = Claims {
            id: user.id.clone(),
            username: user.username.clone(),
            iat,
            exp,
        };
        self.sign(&claims)
    }

    fn sign(&self, claims: &Claims) -> Result<String, AppError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
            .map_err(|e| AppError::Internal(format!("token signing failed: {e}")))
    }

    /// Checks signature and expiry.
    pub fn verify(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        decode::<Claims>(token, &self.decoding, &Validation::new(Algorithm::HS256))
            .map(|data| data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn admin() -> UserProfile {
        UserProfile {
            id: "user-1".into(),
            username: "admin".into(),
        }
    }

    #[test]
    fn issued_token_verifies() {
        let keys = TokenKeys::new("secret", Duration::from_secs(3600));
        let token = keys.issue(&admin()).unwrap();
        let claims = keys.verify(&token).unwrap();

        assert_eq!(claims.id, "user-1");
        assert_eq!(claims.username, "admin");
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn other_secret_is_rejected() {
        let token = TokenKeys::new("secret", Duration::from_secs(60))
            .issue(&admin())
            .unwrap();
        let other = TokenKeys::new("another", Duration::from_secs(60));

        assert!(other.verify(&token).is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        let keys = TokenKeys::new("secret", Duration::from_secs(60));
        let now = Utc::now().timestamp();
        let token = keys
            .sign(&Claims {
                id: "user-1".into(),
                username: "admin".into(),
                iat: now - 7200,
                exp: now - 3600,
            })
            .unwrap();

        assert!(keys.verify(&token).is_err());
    }

    #[test]
    fn garbage_is_rejected() {
        let keys = TokenKeys::new("secret", Duration::from_secs(60));
        assert!(keys.verify("not.a.token").is_err());
    }

    #[test]
    fn oversized_lifetime_is_an_error() {
        let keys = TokenKeys::new("secret", Duration::from_secs(u64::MAX / 2));
        assert!(matches!(keys.issue(&admin()), Err(AppError::Internal(_))));

        let keys = TokenKeys::new("secret", Duration::from_secs(u64::MAX));
        assert!(keys.issue(&admin()).is_err());
    }
}
