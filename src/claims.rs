use crate::config::AuthConfig;
use crate::models::user::User;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

pub const ACCESS_TOKEN_COOKIE: &str = "access_token";

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Claims {
    pub sub: i32,
    pub username: String,
    pub exp: usize,
}

pub fn create_access_token(
    user: &User,
    auth: &AuthConfig,
) -> Result<String, jsonwebtoken::errors::Error> {
    let expiration = Utc::now() + Duration::minutes(auth.token_ttl_minutes);

    let claims = Claims {
        sub: user.id,
        username: user.username.clone(),
        exp: expiration.timestamp() as usize,
    };

    let header = Header::new(Algorithm::HS512);
    encode(
        &header,
        &claims,
        &EncodingKey::from_secret(auth.jwt_secret.as_bytes()),
    )
}

/// Signature and expiry are both checked; anything else yields `None`.
pub fn verify_and_extract_claims(token: &str, auth: &AuthConfig) -> Option<Claims> {
    if token.is_empty() {
        return None;
    }

    let validation = Validation::new(Algorithm::HS512);

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(auth.jwt_secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .ok()
}
