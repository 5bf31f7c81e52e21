pub mod session;

pub use session::{JwtSessionResolver, Session, SessionResolver, SessionUser};

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Claims carried by the session token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etablissement_id: Option<String>,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn new(user_id: Uuid, role: impl Into<String>, etablissement_id: Option<String>, expiry_hours: u64) -> Self {
        let now = Utc::now();
        let exp = (now + Duration::hours(expiry_hours as i64)).timestamp();

        Self {
            sub: user_id,
            role: role.into(),
            etablissement_id,
            exp,
            iat: now.timestamp(),
        }
    }
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("JWT secret not configured")]
    MissingSecret,

    #[error("JWT generation error: {0}")]
    TokenGeneration(String),

    #[error("Invalid session token: {0}")]
    InvalidToken(String),
}

pub fn issue_token(claims: &Claims, secret: &str) -> Result<String, SessionError> {
    if secret.is_empty() {
        return Err(SessionError::MissingSecret);
    }

    let encoding_key = EncodingKey::from_secret(secret.as_bytes());
    encode(&Header::default(), claims, &encoding_key).map_err(|e| SessionError::TokenGeneration(e.to_string()))
}

/// Validate signature and expiry, returning the claims
pub fn verify_token(token: &str, secret: &str) -> Result<Claims, SessionError> {
    if secret.is_empty() {
        return Err(SessionError::MissingSecret);
    }

    let decoding_key = DecodingKey::from_secret(secret.as_bytes());
    decode::<Claims>(token, &decoding_key, &Validation::default())
        .map(|data| data.claims)
        .map_err(|e| SessionError::InvalidToken(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_and_verify() {
        let user_id = Uuid::new_v4();
        let claims = Claims::new(user_id, "ADMIN", Some("etab-1".to_string()), 1);
        let token = issue_token(&claims, "secret").unwrap();

        let decoded = verify_token(&token, "secret").unwrap();
        assert_eq!(decoded.sub, user_id);
        assert_eq!(decoded.role, "ADMIN");
        assert_eq!(decoded.etablissement_id.as_deref(), Some("etab-1"));
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let claims = Claims::new(Uuid::new_v4(), "TEACHER", None, 1);
        let token = issue_token(&claims, "secret").unwrap();
        assert!(matches!(verify_token(&token, "other"), Err(SessionError::InvalidToken(_))));
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let mut claims = Claims::new(Uuid::new_v4(), "TEACHER", None, 1);
        claims.iat -= 7200;
        claims.exp = Utc::now().timestamp() - 3600;
        let token = issue_token(&claims, "secret").unwrap();
        assert!(verify_token(&token, "secret").is_err());
    }

    #[test]
    fn test_empty_secret_is_refused() {
        let claims = Claims::new(Uuid::new_v4(), "ADMIN", None, 1);
        assert!(matches!(issue_token(&claims, ""), Err(SessionError::MissingSecret)));
    }
}
