use super::handlers;
use actix_web::{web, Scope};

pub fn routes() -> Scope {
    // literal paths go before `/{epigram_id}`
    web::scope("/epigrams")
        .service(handlers::random_epigram)
        .service(handlers::random_batch)
        .service(handlers::my_epigrams)
        .service(handlers::create_epigram)
        .service(handlers::update_epigram)
        .service(handlers::delete_epigram)
}
