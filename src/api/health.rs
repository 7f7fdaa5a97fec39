use crate::observability::{HealthStatus, Uptime};
use crate::RqDbPool;
use actix_web::{get, web, HttpResponse, Responder};
use serde_json::json;

/// Health check endpoint for load balancers
#[get("")]
pub async fn health_check(pool: RqDbPool, uptime: web::Data<Uptime>) -> impl Responder {
    let status = web::block(move || HealthStatus::check(&uptime, &pool)).await;
    match status {
        Ok(status) if status.is_healthy() => HttpResponse::Ok().json(status),
        Ok(status) => HttpResponse::ServiceUnavailable().json(status),
        Err(_) => HttpResponse::ServiceUnavailable().json(json!({
            "status": "unhealthy"
        })),
    }
}

/// Readiness check - can we hand out a connection
#[get("/ready")]
pub async fn readiness_check(pool: RqDbPool) -> impl Responder {
    match pool.get() {
        Ok(_) => HttpResponse::Ok().json(json!({
            "status": "ready",
            "database": "connected"
        })),
        Err(_) => HttpResponse::ServiceUnavailable().json(json!({
            "status": "not_ready",
            "database": "disconnected"
        })),
    }
}

/// Liveness check - simple check to see if the app is alive
#[get("/live")]
pub async fn liveness_check() -> impl Responder {
    HttpResponse::Ok().json(json!({
        "status": "alive",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

pub fn routes() -> actix_web::Scope {
    web::scope("/health")
        .service(health_check)
        .service(readiness_check)
        .service(liveness_check)
}
