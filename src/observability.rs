use diesel::prelude::*;
use std::time::SystemTime;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize structured logging and tracing. `log` records from the models
/// are forwarded into the same subscriber.
pub fn init_logging() {
    let config = ObservabilityConfig::from_env();

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    if config.log_format == "json" {
        // JSON structured logging for production
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_current_span(false)
                    .with_span_list(false),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .pretty()
                    .with_target(true)
                    .with_thread_ids(false),
            )
            .init();
    }

    info!(
        service = "epigrams",
        version = env!("CARGO_PKG_VERSION"),
        log_level = %config.log_level,
        log_format = %config.log_format,
        "Logging initialized"
    );
}

/// Process start time, shared with the health endpoints.
#[derive(Clone, Copy, Debug)]
pub struct Uptime {
    pub start_time: SystemTime,
}

impl Uptime {
    pub fn new() -> Self {
        Self {
            start_time: SystemTime::now(),
        }
    }

    pub fn seconds(&self) -> u64 {
        self.start_time
            .elapsed()
            .map(|d| d.as_secs())
            .unwrap_or(0)
    }
}

impl Default for Uptime {
    fn default() -> Self {
        Self::new()
    }
}

/// Application health status
#[derive(Clone, Debug, serde::Serialize)]
pub struct HealthStatus {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub checks: HealthChecks,
}

#[derive(Clone, Debug, serde::Serialize)]
pub struct HealthChecks {
    pub database: String,
}

impl HealthStatus {
    pub fn check(uptime: &Uptime, pool: &crate::DbPool) -> Self {
        let database_status = check_database_health(pool);

        Self {
            status: database_status.clone(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime_seconds: uptime.seconds(),
            checks: HealthChecks {
                database: database_status,
            },
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}

/// Check database connectivity
fn check_database_health(pool: &crate::DbPool) -> String {
    match pool.get() {
        Ok(mut conn) => match diesel::sql_query("SELECT 1").execute(&mut conn) {
            Ok(_) => "healthy".to_string(),
            Err(_) => "unhealthy".to_string(),
        },
        Err(_) => "unhealthy".to_string(),
    }
}

/// Structured logging macros for consistent log format
#[macro_export]
macro_rules! log_user_action {
    ($user_id:expr, $action:expr, $($details:tt)+) => {
        tracing::info!(
            user_id = $user_id,
            action = $action,
            details = %serde_json::json!($($details)+),
            "User action performed"
        );
    };
}

#[macro_export]
macro_rules! log_security_event {
    ($event_type:expr, $($details:tt)+) => {
        tracing::warn!(
            event_type = $event_type,
            details = %serde_json::json!($($details)+),
            "Security event detected"
        );
    };
}

/// Environment configuration
pub struct ObservabilityConfig {
    pub log_level: String,
    pub log_format: String,
}

impl ObservabilityConfig {
    pub fn from_env() -> Self {
        Self {
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            log_format: std::env::var("LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string()),
        }
    }
}
