use super::handlers;
use actix_web::{web, Scope};

pub fn routes() -> Scope {
    web::scope("/auth")
        .service(handlers::register)
        .service(handlers::login)
        .service(handlers::logout)
        .service(handlers::me)
        .service(handlers::verify_token)
}
