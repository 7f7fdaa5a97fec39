use rand::distributions::Alphanumeric;
use rand::{rngs::OsRng, Rng};
use std::env;
use std::str::FromStr;
use thiserror::Error;

const DEFAULT_DATABASE_URL: &str = "epigrams.db";
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_TOKEN_TTL_MINUTES: i64 = 30;
const DEFAULT_CORS_ORIGIN: &str = "http://localhost:5173";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {var}: {value:?}")]
    InvalidValue { var: &'static str, value: String },
}

/// Token signing and cookie settings shared by the auth handlers and extractor.
#[derive(Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_ttl_minutes: i64,
    pub secure_cookies: bool,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"<redacted>")
            .field("token_ttl_minutes", &self.token_ttl_minutes)
            .field("secure_cookies", &self.secure_cookies)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub cors_origin: String,
    pub auth: AuthConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("EPIGRAMS_DATABASE_URL").unwrap_or_else(|| {
            log::info!("Using default database path: {}", DEFAULT_DATABASE_URL);
            DEFAULT_DATABASE_URL.to_string()
        });
        let host = lookup("EPIGRAMS_HOST").unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = parse_or("EPIGRAMS_PORT", &lookup, DEFAULT_PORT)?;
        let cors_origin =
            lookup("EPIGRAMS_CORS_ORIGIN").unwrap_or_else(|| DEFAULT_CORS_ORIGIN.to_string());

        let token_ttl_minutes =
            parse_or("EPIGRAMS_TOKEN_TTL_MINUTES", &lookup, DEFAULT_TOKEN_TTL_MINUTES)?;
        if token_ttl_minutes <= 0 {
            return Err(ConfigError::InvalidValue {
                var: "EPIGRAMS_TOKEN_TTL_MINUTES",
                value: token_ttl_minutes.to_string(),
            });
        }

        let secure_cookies = match lookup("EPIGRAMS_SECURE_COOKIES").as_deref() {
            None => false,
            Some("1") | Some("true") => true,
            Some("0") | Some("false") => false,
            Some(other) => {
                return Err(ConfigError::InvalidValue {
                    var: "EPIGRAMS_SECURE_COOKIES",
                    value: other.to_string(),
                })
            }
        };

        let jwt_secret = match lookup("EPIGRAMS_JWT_SECRET") {
            Some(secret) if !secret.is_empty() => secret,
            _ => {
                log::warn!(
                    "EPIGRAMS_JWT_SECRET is not set; generated a random secret, sessions will not survive a restart"
                );
                generate_jwt_secret()
            }
        };

        Ok(AppConfig {
            database_url,
            host,
            port,
            cors_origin,
            auth: AuthConfig {
                jwt_secret,
                token_ttl_minutes,
                secure_cookies,
            },
        })
    }
}

fn parse_or<T, F>(var: &'static str, lookup: &F, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(var) {
        Some(value) => value
            .parse::<T>()
            .map_err(|_| ConfigError::InvalidValue { var, value }),
        None => Ok(default),
    }
}

fn generate_jwt_secret() -> String {
    OsRng
        .sample_iter(&Alphanumeric)
        .take(32)
        .map(char::from)
        .collect()
}
