use std::future::{ready, Ready};

use crate::claims::{verify_and_extract_claims, Claims, ACCESS_TOKEN_COOKIE};
use crate::config::AuthConfig;
use crate::models::user::{User, UserQuery};
use crate::RqDbPool;
use actix_web::{
    dev::Payload, error::ResponseError, http::StatusCode, web, FromRequest, HttpRequest,
    HttpResponse,
};
use derive_more::Display;
use serde_json::json;

#[derive(Debug, Display)]
enum SessionError {
    #[display(fmt = "no_session_cookie")]
    NoSessionCookie,
    #[display(fmt = "invalid_session")]
    InvalidSession,
    #[display(fmt = "server_misconfigured")]
    MissingAppData,
    #[display(fmt = "database_error")]
    DatabaseError,
}

impl ResponseError for SessionError {
    fn error_response(&self) -> HttpResponse {
        let (code, message) = match self {
            Self::NoSessionCookie | Self::InvalidSession => {
                ("UNAUTHORIZED", "Authentication required - please log in")
            }
            Self::MissingAppData | Self::DatabaseError => {
                ("INTERNAL_ERROR", "An unexpected error occurred - please try again")
            }
        };
        HttpResponse::build(self.status_code()).json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }))
    }

    fn status_code(&self) -> StatusCode {
        match self {
            Self::NoSessionCookie | Self::InvalidSession => StatusCode::UNAUTHORIZED,
            Self::MissingAppData | Self::DatabaseError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// The logged-in, active user behind the request's `access_token` cookie.
#[derive(Clone, Debug)]
pub struct AuthUser(pub User);

impl AuthUser {
    pub fn id(&self) -> i32 {
        self.0.id
    }
}

impl FromRequest for AuthUser {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(authenticate_request(req).map_err(Into::into))
    }
}

/// Verified token claims without the database round trip.
pub fn claims_from_request(req: &HttpRequest, auth: &AuthConfig) -> Option<Claims> {
    let token = req.cookie(ACCESS_TOKEN_COOKIE)?;
    verify_and_extract_claims(token.value(), auth)
}

fn authenticate_request(req: &HttpRequest) -> Result<AuthUser, SessionError> {
    let auth = req.app_data::<web::Data<AuthConfig>>().ok_or_else(|| {
        log::error!("Failed to get auth config from app data");
        SessionError::MissingAppData
    })?;
    let pool = req.app_data::<RqDbPool>().ok_or_else(|| {
        log::error!("Failed to get database pool from app data");
        SessionError::MissingAppData
    })?;

    if req.cookie(ACCESS_TOKEN_COOKIE).is_none() {
        log::debug!("No access token cookie found");
        return Err(SessionError::NoSessionCookie);
    }

    let claims = claims_from_request(req, auth).ok_or_else(|| {
        log::debug!("Invalid or expired access token");
        SessionError::InvalidSession
    })?;

    let mut conn = pool.get().map_err(|_| SessionError::DatabaseError)?;

    let user = User::get(&mut conn, UserQuery::Id(claims.sub)).ok_or_else(|| {
        log::debug!("Token for missing user {}", claims.sub);
        SessionError::InvalidSession
    })?;

    if !user.is_active {
        log::debug!("Token for deactivated user {}", user.id);
        return Err(SessionError::InvalidSession);
    }

    Ok(AuthUser(user))
}

/// Cookie helpers for login and logout responses
pub mod session_manager {
    use super::*;
    use actix_web::cookie::{time::Duration, Cookie, SameSite};

    pub fn login_cookie(token: String, auth: &AuthConfig) -> Cookie<'static> {
        Cookie::build(ACCESS_TOKEN_COOKIE, token)
            .secure(auth.secure_cookies)
            .http_only(true)
            .same_site(SameSite::Lax)
            .max_age(Duration::minutes(auth.token_ttl_minutes))
            .path("/")
            .finish()
    }

    pub fn logout_cookie(auth: &AuthConfig) -> Cookie<'static> {
        let mut cookie = Cookie::build(ACCESS_TOKEN_COOKIE, "")
            .secure(auth.secure_cookies)
            .http_only(true)
            .same_site(SameSite::Lax)
            .path("/")
            .finish();
        cookie.make_removal();
        cookie
    }
}
