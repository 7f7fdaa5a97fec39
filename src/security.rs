use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::{HeaderName, HeaderValue},
    Error,
};
use futures_util::future::LocalBoxFuture;
use std::{
    future::{ready, Ready},
    rc::Rc,
};

/// Security headers middleware
pub struct SecurityHeaders;

impl<S, B> Transform<S, ServiceRequest> for SecurityHeaders
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = SecurityHeadersMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(SecurityHeadersMiddleware {
            service: Rc::new(service),
        }))
    }
}

pub struct SecurityHeadersMiddleware<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for SecurityHeadersMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let srv = self.service.clone();

        Box::pin(async move {
            let mut res = srv.call(req).await?;
            let headers = res.headers_mut();

            headers.insert(
                HeaderName::from_static("x-frame-options"),
                HeaderValue::from_static("DENY"),
            );
            headers.insert(
                HeaderName::from_static("x-content-type-options"),
                HeaderValue::from_static("nosniff"),
            );
            headers.insert(
                HeaderName::from_static("referrer-policy"),
                HeaderValue::from_static("strict-origin-when-cross-origin"),
            );
            // JSON only, nothing to load
            headers.insert(
                HeaderName::from_static("content-security-policy"),
                HeaderValue::from_static("default-src 'none'; frame-ancestors 'none'"),
            );

            // Only add HSTS in production (when using HTTPS)
            if cfg!(not(debug_assertions)) {
                headers.insert(
                    HeaderName::from_static("strict-transport-security"),
                    HeaderValue::from_static("max-age=31536000; includeSubDomains"),
                );
            }

            Ok(res)
        })
    }
}

/// Input validation utilities
pub mod validation {
    use regex::Regex;
    use std::sync::OnceLock;

    pub const MAX_EPIGRAM_TEXT_CHARS: usize = 150;
    pub const MAX_EPIGRAM_AUTHOR_CHARS: usize = 50;
    pub const MAX_BATCH_COUNT: i64 = 20;
    pub const DEFAULT_BATCH_COUNT: i64 = 5;
    pub const DEFAULT_PAGE_LIMIT: i64 = 10;

    static USERNAME_REGEX: OnceLock<Regex> = OnceLock::new();

    const PASSWORD_SPECIALS: &str = r#"!@#$%^&*()_+-=[]{};':"\|,.<>/?"#;

    /// 3-50 characters from letters, digits, underscore and hyphen
    pub fn validate_username(username: &str) -> Result<(), String> {
        let len = username.chars().count();
        if !(3..=50).contains(&len) {
            return Err("Username must be between 3 and 50 characters".to_string());
        }

        let username_regex =
            USERNAME_REGEX.get_or_init(|| Regex::new(r"^[a-zA-Z0-9_-]+$").unwrap());

        if !username_regex.is_match(username) {
            return Err(
                "Username can only contain letters, numbers, underscores, and hyphens".to_string(),
            );
        }

        Ok(())
    }

    pub fn validate_password(password: &str) -> Result<(), String> {
        let len = password.chars().count();
        if len < 8 {
            return Err("Password must be at least 8 characters long".to_string());
        }
        if len > 50 {
            return Err("Password must be at most 50 characters long".to_string());
        }
        if !password.chars().any(|c| c.is_ascii_uppercase()) {
            return Err("Password must contain at least one uppercase letter".to_string());
        }
        if !password.chars().any(|c| c.is_ascii_lowercase()) {
            return Err("Password must contain at least one lowercase letter".to_string());
        }
        if !password.chars().any(|c| c.is_ascii_digit()) {
            return Err("Password must contain at least one number".to_string());
        }
        if !password.chars().any(|c| PASSWORD_SPECIALS.contains(c)) {
            return Err("Password must contain at least one special character".to_string());
        }
        Ok(())
    }

    /// Trims both fields and maps a blank author to `None`.
    pub fn normalize_epigram(
        text: &str,
        author: Option<&str>,
    ) -> Result<(String, Option<String>), String> {
        let text = text.trim();
        if text.is_empty() {
            return Err("Text cannot be empty".to_string());
        }
        if text.chars().count() > MAX_EPIGRAM_TEXT_CHARS {
            return Err(format!(
                "Text too long (max {} characters)",
                MAX_EPIGRAM_TEXT_CHARS
            ));
        }

        let author = author.map(str::trim).filter(|a| !a.is_empty());
        if let Some(author) = author {
            if author.chars().count() > MAX_EPIGRAM_AUTHOR_CHARS {
                return Err(format!(
                    "Author too long (max {} characters)",
                    MAX_EPIGRAM_AUTHOR_CHARS
                ));
            }
        }

        Ok((text.to_string(), author.map(str::to_string)))
    }

    pub fn validate_batch_count(count: i64) -> Result<(), String> {
        if !(1..=MAX_BATCH_COUNT).contains(&count) {
            return Err(format!("Count must be between 1 and {}", MAX_BATCH_COUNT));
        }
        Ok(())
    }

    pub fn validate_pagination(page: i64, limit: i64) -> Result<(), String> {
        if page < 1 {
            return Err("Page must be at least 1".to_string());
        }
        if !(1..=crate::models::epigram::MAX_PAGE_SIZE).contains(&limit) {
            return Err(format!(
                "Limit must be between 1 and {}",
                crate::models::epigram::MAX_PAGE_SIZE
            ));
        }
        Ok(())
    }

}

/// Rate limiting configuration for different endpoints
pub use actix_governor::{GovernorConfig, GovernorConfigBuilder};

type RateLimiterConfig = GovernorConfig<
    actix_governor::PeerIpKeyExtractor,
    actix_governor::governor::middleware::StateInformationMiddleware,
>;

pub fn create_rate_limiter() -> RateLimiterConfig {
    GovernorConfigBuilder::default()
        .per_second(10)
        .burst_size(20)
        .use_headers()
        .finish()
        .expect("rate limiter quota is non-zero")
}

pub fn create_auth_rate_limiter() -> RateLimiterConfig {
    // Brute force protection for login and register
    GovernorConfigBuilder::default()
        .per_second(1)
        .burst_size(5)
        .use_headers()
        .finish()
        .expect("rate limiter quota is non-zero")
}
