//! JWT Token Generation and Validation
//!
//! HS256 access tokens signed with the shared `JWT_SECRET`. The token only
//! carries the subject id; role and permissions are re-read from the
//! database on every request so a role change takes effect immediately.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::AuthResult;

/// JWT claims for access tokens.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID as UUID string).
    pub sub: String,
    /// Expiration time (Unix timestamp).
    pub exp: i64,
    /// Issued at (Unix timestamp).
    pub iat: i64,
}

/// Generate an access token for `user_id`.
pub fn generate_access_token(user_id: Uuid, secret: &str, expiry_seconds: i64) -> AuthResult<String> {
    let now = Utc::now();
    let claims = Claims {
        sub: user_id.to_string(),
        exp: (now + Duration::seconds(expiry_seconds)).timestamp(),
        iat: now.timestamp(),
    };

    Ok(encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?)
}

/// Validate an access token and return its claims.
///
/// Expiry is checked by `jsonwebtoken`'s default validation.
pub fn validate_access_token(token: &str, secret: &str) -> AuthResult<Claims> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let user_id = Uuid::now_v7();
        let token = generate_access_token(user_id, "secret", 60).unwrap();
        let claims = validate_access_token(&token, "secret").unwrap();

        assert_eq!(claims.sub, user_id.to_string());
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = generate_access_token(Uuid::now_v7(), "secret", 60).unwrap();
        assert!(validate_access_token(&token, "other-secret").is_err());
    }

    #[test]
    fn test_expired_token_rejected() {
        let token = generate_access_token(Uuid::now_v7(), "secret", -120).unwrap();
        assert!(validate_access_token(&token, "secret").is_err());
    }

    #[test]
    fn test_garbage_rejected() {
        assert!(validate_access_token("not-a-jwt", "secret").is_err());
    }
}
