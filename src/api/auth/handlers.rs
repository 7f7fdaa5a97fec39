use super::types::{LoginRequest, RegisterRequest, TokenStatus};
use crate::claims::create_access_token;
use crate::config::AuthConfig;
use crate::errors::{AppError, AppResult};
use crate::models::user::{NewUser, User};
use crate::security::validation;
use crate::session::{session_manager, AuthUser};
use crate::{log_security_event, log_user_action, RqDbPool};
use actix_web::{get, post, web, HttpResponse, HttpResponseBuilder};
use serde_json::json;

fn with_access_token(
    mut builder: HttpResponseBuilder,
    user: &User,
    auth: &AuthConfig,
) -> AppResult<HttpResponse> {
    let token = create_access_token(user, auth).map_err(|e| {
        log::error!("Failed to sign access token: {}", e);
        AppError::InternalError
    })?;
    Ok(builder
        .cookie(session_manager::login_cookie(token, auth))
        .json(user))
}

/// Creates the account and logs it in.
#[post("/register")]
pub async fn register(
    pool: RqDbPool,
    auth: web::Data<AuthConfig>,
    body: web::Json<RegisterRequest>,
) -> AppResult<HttpResponse> {
    let RegisterRequest { username, password } = body.into_inner();

    validation::validate_username(&username)
        .map_err(|msg| AppError::invalid_input("username", &msg))?;
    validation::validate_password(&password)
        .map_err(|msg| AppError::invalid_input("password", &msg))?;

    let user = web::block(move || -> AppResult<User> {
        let mut conn = pool.get()?;
        Ok(User::register(&mut conn, &NewUser { username, password })?)
    })
    .await??;

    log_user_action!(user.id, "register", { "username": user.username });
    with_access_token(HttpResponse::Created(), &user, &auth)
}

#[post("/login")]
pub async fn login(
    pool: RqDbPool,
    auth: web::Data<AuthConfig>,
    body: web::Json<LoginRequest>,
) -> AppResult<HttpResponse> {
    let LoginRequest { username, password } = body.into_inner();

    if username.is_empty() || password.is_empty() || password.len() > 128 {
        return Err(AppError::InvalidCredentials);
    }

    let attempted = username.clone();
    let user = web::block(move || -> AppResult<Option<User>> {
        let mut conn = pool.get()?;
        Ok(User::authenticate(&mut conn, &username, &password))
    })
    .await??;

    let user = match user {
        Some(user) => user,
        None => {
            log_security_event!("login_failed", { "username": attempted });
            return Err(AppError::InvalidCredentials);
        }
    };

    if !user.is_active {
        log_security_event!("login_deactivated", { "user_id": user.id });
        return Err(AppError::AccountDeactivated);
    }

    tracing::info!(user_id = user.id, username = %user.username, "User login successful");
    with_access_token(HttpResponse::Ok(), &user, &auth)
}

#[post("/logout")]
pub async fn logout(auth: web::Data<AuthConfig>) -> HttpResponse {
    HttpResponse::Ok()
        .cookie(session_manager::logout_cookie(&auth))
        .json(json!({ "message": "Successfully logged out" }))
}

#[get("/me")]
pub async fn me(user: AuthUser) -> HttpResponse {
    HttpResponse::Ok().json(user.0)
}

#[post("/verify-token")]
pub async fn verify_token(user: AuthUser) -> HttpResponse {
    HttpResponse::Ok().json(TokenStatus {
        valid: true,
        user_id: user.0.id,
        username: user.0.username,
    })
}
