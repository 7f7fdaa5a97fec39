use actix_web::web;

use crate::models::user_settings::PartialUserSettings;

pub type RqSettingsUpdate = web::Json<PartialUserSettings>;
