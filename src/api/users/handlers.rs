use super::types::RqSettingsUpdate;
use crate::errors::{AppError, AppResult};
use crate::models::user_settings::UserSettings;
use crate::session::AuthUser;
use crate::{log_user_action, RqDbPool};
use actix_web::{delete, get, put, web, HttpResponse};
use serde_json::json;

#[get("/settings")]
pub async fn get_settings(pool: RqDbPool, user: AuthUser) -> AppResult<HttpResponse> {
    let owner_id = user.id();
    let settings = web::block(move || -> AppResult<Option<UserSettings>> {
        let mut conn = pool.get()?;
        Ok(UserSettings::get(&mut conn, owner_id)?)
    })
    .await??;

    settings
        .map(|settings| HttpResponse::Ok().json(settings))
        .ok_or_else(|| AppError::resource_not_found("User settings"))
}

/// Partial update; omitted fields keep their values.
#[put("/settings")]
pub async fn update_settings(
    pool: RqDbPool,
    user: AuthUser,
    changes: RqSettingsUpdate,
) -> AppResult<HttpResponse> {
    let owner_id = user.id();
    let changes = changes.into_inner();

    let settings = web::block(move || -> AppResult<Option<UserSettings>> {
        let mut conn = pool.get()?;
        if changes.is_empty() {
            return Ok(UserSettings::get(&mut conn, owner_id)?);
        }
        Ok(UserSettings::update(&mut conn, owner_id, &changes)?)
    })
    .await??;

    let settings = settings.ok_or_else(|| AppError::resource_not_found("User settings"))?;
    log_user_action!(owner_id, "update_settings", {
        "auto_reload_enabled": settings.auto_reload_enabled,
        "auto_reload_interval_minutes": settings.auto_reload_interval_minutes
    });
    Ok(HttpResponse::Ok().json(settings))
}

/// Resets to defaults by deleting and recreating the row.
#[delete("/settings")]
pub async fn reset_settings(pool: RqDbPool, user: AuthUser) -> AppResult<HttpResponse> {
    let owner_id = user.id();
    let reset = web::block(move || -> AppResult<Option<UserSettings>> {
        let mut conn = pool.get()?;
        Ok(UserSettings::reset(&mut conn, owner_id)?)
    })
    .await??;

    match reset {
        Some(_) => Ok(HttpResponse::Ok().json(json!({
            "message": "User settings reset to defaults"
        }))),
        None => Err(AppError::resource_not_found("User settings")),
    }
}
