use super::handlers;
use actix_web::{web, Scope};

pub fn routes() -> Scope {
    web::scope("/users")
        .service(handlers::get_settings)
        .service(handlers::update_settings)
        .service(handlers::reset_settings)
}
