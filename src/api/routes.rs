use super::{auth, epigrams, health, users};
use actix_web::web;

/// Registers every API scope without rate limiting. The server wraps the
/// scopes individually instead.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(health::routes())
        .service(auth::routes())
        .service(epigrams::routes())
        .service(users::routes());
}
