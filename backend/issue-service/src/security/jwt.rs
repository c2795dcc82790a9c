//! JWT token generation and validation using HS256
//!
//! The signing secret comes from configuration and is passed in explicitly,
//! so tests can run with throwaway secrets and no global state.

use anyhow::{anyhow, Result};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// JWT Claims structure
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Token type, always "access"
    pub token_type: String,
    /// Email address
    pub email: String,
    /// Display name
    pub name: String,
}

/// Generate an access token for a user
pub fn generate_access_token(
    secret: &str,
    user_id: Uuid,
    email: &str,
    name: &str,
    expiry_hours: i64,
) -> Result<String> {
    let now = Utc::now();
    let expiry = now + Duration::hours(expiry_hours);

    let claims = Claims {
        sub: user_id.to_string(),
        iat: now.timestamp(),
        exp: expiry.timestamp(),
        token_type: "access".to_string(),
        email: email.to_string(),
        name: name.to_string(),
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| anyhow!("Failed to generate access token: {}", e))
}

/// Validate a token and return its claims
pub fn validate_token(secret: &str, token: &str) -> Result<Claims> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::new(Algorithm::HS256),
    )
    .map_err(|e| anyhow!("Invalid token: {}", e))?;

    Ok(data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret";

    #[test]
    fn test_round_trip() {
        let user_id = Uuid::new_v4();
        let token =
            generate_access_token(SECRET, user_id, "a@example.com", "Asha", 24).unwrap();

        let claims = validate_token(SECRET, &token).unwrap();
        assert_eq!(claims.sub, user_id.to_string());
        assert_eq!(claims.email, "a@example.com");
        assert_eq!(claims.token_type, "access");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token =
            generate_access_token(SECRET, Uuid::new_v4(), "a@example.com", "Asha", 24).unwrap();
        assert!(validate_token("other-secret", &token).is_err());
    }

    #[test]
    fn test_garbage_token_rejected() {
        assert!(validate_token(SECRET, "not.a.token").is_err());
    }
}
