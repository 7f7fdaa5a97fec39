use crate::schema::*;
use chrono::Utc;
use diesel::{prelude::*, result::Error as DieselError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_AUTO_RELOAD_ENABLED: bool = false;
pub const DEFAULT_AUTO_RELOAD_INTERVAL_MINUTES: i32 = 5;
pub const MIN_AUTO_RELOAD_INTERVAL_MINUTES: i32 = 1;
pub const MAX_AUTO_RELOAD_INTERVAL_MINUTES: i32 = 240;

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Selectable, Identifiable, PartialEq)]
#[diesel(table_name = user_settings)]
pub struct UserSettings {
    pub id: i32,
    pub user_id: i32,
    pub auto_reload_enabled: bool,
    pub auto_reload_interval_minutes: i32,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = user_settings)]
pub struct NewUserSettings {
    pub user_id: i32,
    pub auto_reload_enabled: bool,
    pub auto_reload_interval_minutes: i32,
    pub created_at: i64,
    pub updated_at: i64,
}

impl NewUserSettings {
    pub fn defaults(user_id: i32, now: i64) -> Self {
        NewUserSettings {
            user_id,
            auto_reload_enabled: DEFAULT_AUTO_RELOAD_ENABLED,
            auto_reload_interval_minutes: DEFAULT_AUTO_RELOAD_INTERVAL_MINUTES,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update; `None` fields are left untouched.
#[derive(Debug, Default, Clone, Serialize, Deserialize, AsChangeset)]
#[diesel(table_name = user_settings)]
pub struct PartialUserSettings {
    pub auto_reload_enabled: Option<bool>,
    pub auto_reload_interval_minutes: Option<i32>,
    #[serde(skip)]
    pub updated_at: Option<i64>,
}

impl PartialUserSettings {
    pub fn is_empty(&self) -> bool {
        self.auto_reload_enabled.is_none() && self.auto_reload_interval_minutes.is_none()
    }
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Auto-reload interval must be between 1 and 240 minutes, got {0}")]
    IntervalOutOfRange(i32),
    #[error("Database error: {0}")]
    DatabaseError(#[from] DieselError),
}

pub fn validate_interval(minutes: i32) -> Result<(), SettingsError> {
    if (MIN_AUTO_RELOAD_INTERVAL_MINUTES..=MAX_AUTO_RELOAD_INTERVAL_MINUTES).contains(&minutes) {
        Ok(())
    } else {
        Err(SettingsError::IntervalOutOfRange(minutes))
    }
}

impl UserSettings {
    pub fn get(
        conn: &mut SqliteConnection,
        owner_id: i32,
    ) -> Result<Option<UserSettings>, SettingsError> {
        use crate::schema::user_settings::dsl::*;
        Ok(user_settings
            .filter(user_id.eq(owner_id))
            .select(UserSettings::as_select())
            .first(conn)
            .optional()?)
    }

    /// Applies only the provided fields. Returns `Ok(None)` when the user has no settings row.
    pub fn update(
        conn: &mut SqliteConnection,
        owner_id: i32,
        changes: &PartialUserSettings,
    ) -> Result<Option<UserSettings>, SettingsError> {
        use crate::schema::user_settings::dsl::*;

        if let Some(minutes) = changes.auto_reload_interval_minutes {
            validate_interval(minutes)?;
        }

        let changes = PartialUserSettings {
            updated_at: Some(Utc::now().timestamp()),
            ..changes.clone()
        };

        let updated = diesel::update(user_settings.filter(user_id.eq(owner_id)))
            .set(&changes)
            .returning(UserSettings::as_returning())
            .get_result(conn)
            .optional()?;

        if updated.is_none() {
            log::info!("No settings to update for user {owner_id}");
        }
        Ok(updated)
    }

    /// Returns whether a row was removed.
    pub fn delete(conn: &mut SqliteConnection, owner_id: i32) -> Result<bool, SettingsError> {
        use crate::schema::user_settings::dsl::*;
        let deleted = diesel::delete(user_settings.filter(user_id.eq(owner_id))).execute(conn)?;
        Ok(deleted > 0)
    }

    pub fn recreate_defaults(
        conn: &mut SqliteConnection,
        owner_id: i32,
    ) -> Result<UserSettings, SettingsError> {
        let defaults = NewUserSettings::defaults(owner_id, Utc::now().timestamp());
        diesel::insert_into(user_settings::table)
            .values(&defaults)
            .returning(UserSettings::as_returning())
            .get_result(conn)
            .map_err(SettingsError::from)
    }

    /// Deletes the row (if any) and recreates the defaults in one transaction.
    /// Returns `Ok(None)` when there was nothing to reset.
    pub fn reset(
        conn: &mut SqliteConnection,
        owner_id: i32,
    ) -> Result<Option<UserSettings>, SettingsError> {
        conn.transaction(|conn| {
            if !UserSettings::delete(conn, owner_id)? {
                return Ok(None);
            }
            UserSettings::recreate_defaults(conn, owner_id).map(Some)
        })
    }
}
