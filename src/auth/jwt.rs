use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::ApiError;

/// JWT claims payload.
#[derive(Debug, Serialize, Deserialize, Clone, ToSchema)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// Email of the subject
    pub email: String,
    /// Effective role names, present on login-issued tokens only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roles: Option<Vec<String>>,
    /// Expiration time (Unix timestamp)
    pub exp: usize,
    /// Issued at (Unix timestamp)
    pub iat: usize,
}

/// Create a signed, time-bounded token for a user.
pub fn create_token(
    user_id: Uuid,
    email: &str,
    roles: Option<Vec<String>>,
    secret: &str,
    expiry_hours: u64,
) -> Result<String, ApiError> {
    let now = Utc::now();
    let expires = now + Duration::hours(expiry_hours as i64);

    let claims = Claims {
        sub: user_id.to_string(),
        email: email.to_string(),
        roles,
        exp: expires.timestamp() as usize,
        iat: now.timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| ApiError::Internal(format!("Failed to create token: {}", e)))
}

/// Validate a token's signature and expiry, returning the claims.
pub fn validate_token(token: &str, secret: &str) -> Result<Claims, ApiError> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| ApiError::Unauthorized(format!("Invalid token: {}", e)))?;

    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "unit-test-secret";

    #[test]
    fn create_and_validate_roundtrip() {
        let id = Uuid::new_v4();
        let token = create_token(id, "a@x.com", None, SECRET, 1).unwrap();
        let claims = validate_token(&token, SECRET).unwrap();
        assert_eq!(claims.sub, id.to_string());
        assert_eq!(claims.email, "a@x.com");
        assert!(claims.roles.is_none());
    }

    #[test]
    fn roles_survive_the_roundtrip() {
        let token = create_token(
            Uuid::new_v4(),
            "a@x.com",
            Some(vec!["administrador".to_string()]),
            SECRET,
            1,
        )
        .unwrap();
        let claims = validate_token(&token, SECRET).unwrap();
        assert_eq!(claims.roles.unwrap(), vec!["administrador"]);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = create_token(Uuid::new_v4(), "a@x.com", None, SECRET, 1).unwrap();
        assert!(validate_token(&token, "other-secret").is_err());
    }

    #[test]
    fn tampered_token_is_rejected() {
        let token = create_token(Uuid::new_v4(), "a@x.com", None, SECRET, 1).unwrap();
        let tampered = format!("{}x", token);
        assert!(validate_token(&tampered, SECRET).is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        let now = Utc::now();
        let claims = Claims {
            sub: Uuid::new_v4().to_string(),
            email: "a@x.com".to_string(),
            roles: None,
            exp: (now - Duration::hours(2)).timestamp() as usize,
            iat: (now - Duration::hours(3)).timestamp() as usize,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();
        assert!(validate_token(&token, SECRET).is_err());
    }
}
