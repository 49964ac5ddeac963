use crate::{error::JwtError, models::UserId};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

/// Claims we read from the identity provider's access token.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String, // user_id
    pub exp: i64,    // expiration time
    #[serde(default)]
    pub iat: Option<i64>,
}

pub fn verify_token(token: &str, secret: &[u8]) -> Result<Claims, JwtError> {
    let mut validation = Validation::new(Algorithm::HS256);
    // provider tokens carry an audience we do not pin
    validation.validate_aud = false;
    let token_data = decode::<Claims>(token, &DecodingKey::from_secret(secret), &validation)
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::TokenExpired,
            jsonwebtoken::errors::ErrorKind::InvalidSignature => JwtError::InvalidSignature,
            _ => JwtError::InvalidTokenFormat,
        })?;
    Ok(token_data.claims)
}

/// Verifies the token and turns its subject into the caller's identity.
pub fn caller_from_token(token: &str, secret: &[u8]) -> Result<UserId, JwtError> {
    let claims = verify_token(token, secret)?;
    UserId::parse(&claims.sub).map_err(|_| JwtError::MissingSubject)
}
