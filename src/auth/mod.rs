use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::permissions::Caller;
use crate::types::AccessLevel;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub access: AccessLevel,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn new(user: impl Into<String>, access: AccessLevel, expiry_hours: u64) -> Self {
        let now = Utc::now();
        Self {
            sub: user.into(),
            access,
            exp: (now + Duration::hours(expiry_hours as i64)).timestamp(),
            iat: now.timestamp(),
        }
    }
}

impl From<Claims> for Caller {
    fn from(claims: Claims) -> Self {
        Caller::user(claims.sub, claims.access)
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("JWT secret not configured")]
    MissingSecret,

    #[error("JWT generation error: {0}")]
    TokenGeneration(String),

    #[error("Invalid JWT token: {0}")]
    InvalidToken(String),
}

pub fn generate_jwt(secret: &str, claims: &Claims) -> Result<String, AuthError> {
    if secret.is_empty() {
        return Err(AuthError::MissingSecret);
    }
    let key = EncodingKey::from_secret(secret.as_bytes());
    encode(&Header::default(), claims, &key).map_err(|e| AuthError::TokenGeneration(e.to_string()))
}

pub fn validate_jwt(secret: &str, token: &str) -> Result<Claims, AuthError> {
    if secret.is_empty() {
        return Err(AuthError::MissingSecret);
    }
    let key = DecodingKey::from_secret(secret.as_bytes());
    decode::<Claims>(token, &key, &Validation::default())
        .map(|data| data.claims)
        .map_err(|e| AuthError::InvalidToken(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_round_trip_into_callers() {
        let token = generate_jwt("s3cret", &Claims::new("alice", AccessLevel::Edit, 1)).unwrap();
        let caller: Caller = validate_jwt("s3cret", &token).unwrap().into();
        assert_eq!(caller, Caller::user("alice", AccessLevel::Edit));
    }

    #[test]
    fn wrong_secret_and_expired_tokens_are_rejected() {
        let token = generate_jwt("s3cret", &Claims::new("alice", AccessLevel::Edit, 1)).unwrap();
        assert!(matches!(validate_jwt("other", &token), Err(AuthError::InvalidToken(_))));

        let mut claims = Claims::new("bob", AccessLevel::Read, 1);
        claims.exp = Utc::now().timestamp() - 3600;
        let stale = generate_jwt("s3cret", &claims).unwrap();
        assert!(validate_jwt("s3cret", &stale).is_err());
    }

    #[test]
    fn empty_secret_is_refused() {
        let claims = Claims::new("alice", AccessLevel::Read, 1);
        assert!(matches!(generate_jwt("", &claims), Err(AuthError::MissingSecret)));
    }
}
