use crate::models::epigram::EpigramError;
use crate::models::user::UserTableError;
use crate::models::user_settings::SettingsError;
use actix_web::{error::BlockingError, http::StatusCode, HttpResponse, ResponseError};
use diesel::r2d2;
use serde_json::json;
use std::fmt;

/// Application-wide error types with user-friendly messages
#[derive(Debug)]
pub enum AppError {
    // Authentication & Authorization
    InvalidCredentials,
    AccountDeactivated,
    Forbidden,

    // Validation Errors
    InvalidInput { field: String, message: String },
    DuplicateResource { resource: String },
    Conflict { resource: String },
    ResourceNotFound { resource: String },

    // Database Errors
    DatabaseError,
    ConnectionPoolError,

    // System Errors
    InternalError,
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // Authentication & Authorization
            AppError::InvalidCredentials => write!(f, "Invalid username or password"),
            AppError::AccountDeactivated => write!(f, "Account is deactivated"),
            AppError::Forbidden => write!(f, "Access denied"),

            // Validation Errors
            AppError::InvalidInput { field, message } => write!(f, "Invalid {}: {}", field, message),
            AppError::DuplicateResource { resource } => write!(f, "{} already exists", resource),
            AppError::Conflict { resource } => write!(f, "{} already exists", resource),
            AppError::ResourceNotFound { resource } => write!(f, "{} not found", resource),

            // Database Errors
            AppError::DatabaseError => write!(f, "A database error occurred - please try again"),
            AppError::ConnectionPoolError => {
                write!(f, "Service temporarily unavailable - please try again")
            }

            // System Errors
            AppError::InternalError => write!(f, "An unexpected error occurred - please try again"),
        }
    }
}

impl AppError {
    fn code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::InvalidInput { .. } => (StatusCode::BAD_REQUEST, "INVALID_INPUT"),
            AppError::DuplicateResource { .. } => (StatusCode::BAD_REQUEST, "DUPLICATE_RESOURCE"),

            AppError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "INVALID_CREDENTIALS"),

            AppError::Forbidden => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            AppError::AccountDeactivated => (StatusCode::FORBIDDEN, "ACCOUNT_DEACTIVATED"),

            AppError::ResourceNotFound { .. } => (StatusCode::NOT_FOUND, "RESOURCE_NOT_FOUND"),

            AppError::Conflict { .. } => (StatusCode::CONFLICT, "CONFLICT"),

            AppError::DatabaseError => (StatusCode::INTERNAL_SERVER_ERROR, "DATABASE_ERROR"),
            AppError::ConnectionPoolError => {
                (StatusCode::INTERNAL_SERVER_ERROR, "CONNECTION_POOL_ERROR")
            }
            AppError::InternalError => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        self.code().0
    }

    fn error_response(&self) -> HttpResponse {
        let (status, error_code) = self.code();

        match self {
            AppError::DatabaseError | AppError::ConnectionPoolError | AppError::InternalError => {
                log::error!("Server error: {:?}", self);
            }
            AppError::InvalidCredentials => {
                log::warn!("Authentication failed: {:?}", self);
            }
            _ => {
                log::info!("Client error: {:?}", self);
            }
        }

        HttpResponse::build(status).json(json!({
            "error": {
                "code": error_code,
                "message": self.to_string()
            }
        }))
    }
}

/// Result type alias for application errors
pub type AppResult<T> = Result<T, AppError>;

/// Helper functions for common error conversions
impl AppError {
    pub fn invalid_input(field: &str, message: &str) -> Self {
        AppError::InvalidInput {
            field: field.to_string(),
            message: message.to_string(),
        }
    }

    pub fn duplicate_resource(resource: &str) -> Self {
        AppError::DuplicateResource {
            resource: resource.to_string(),
        }
    }

    pub fn conflict(resource: &str) -> Self {
        AppError::Conflict {
            resource: resource.to_string(),
        }
    }

    pub fn resource_not_found(resource: &str) -> Self {
        AppError::ResourceNotFound {
            resource: resource.to_string(),
        }
    }
}

/// Convert database connection pool errors
impl From<r2d2::PoolError> for AppError {
    fn from(err: r2d2::PoolError) -> Self {
        log::error!("Database connection pool error: {}", err);
        AppError::ConnectionPoolError
    }
}

/// Convert diesel database errors
impl From<diesel::result::Error> for AppError {
    fn from(err: diesel::result::Error) -> Self {
        use diesel::result::Error as DieselError;

        match err {
            DieselError::NotFound => AppError::resource_not_found("Record"),
            _ => {
                log::error!("Database error: {}", err);
                AppError::DatabaseError
            }
        }
    }
}

/// A `web::block` closure panicked or the thread pool is gone
impl From<BlockingError> for AppError {
    fn from(err: BlockingError) -> Self {
        log::error!("Blocking task failed: {}", err);
        AppError::InternalError
    }
}

impl From<EpigramError> for AppError {
    fn from(err: EpigramError) -> Self {
        match err {
            EpigramError::NotFound => AppError::resource_not_found("Epigram"),
            EpigramError::PermissionDenied => AppError::Forbidden,
            EpigramError::Duplicate => {
                AppError::conflict("An epigram with the same text and author")
            }
            EpigramError::DatabaseError(e) => AppError::from(e),
        }
    }
}

impl From<UserTableError> for AppError {
    fn from(err: UserTableError) -> Self {
        match err {
            UserTableError::UsernameExists => AppError::duplicate_resource("Username"),
            UserTableError::PasswordTooShort => {
                AppError::invalid_input("password", "Password is too short")
            }
            UserTableError::UserNotFound => AppError::resource_not_found("User"),
            UserTableError::PasswordHashError => AppError::InternalError,
            UserTableError::DatabaseError => AppError::DatabaseError,
        }
    }
}

impl From<SettingsError> for AppError {
    fn from(err: SettingsError) -> Self {
        match err {
            SettingsError::IntervalOutOfRange(_) => {
                AppError::invalid_input("auto_reload_interval_minutes", &err.to_string())
            }
            SettingsError::DatabaseError(e) => AppError::from(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (AppError::from(EpigramError::NotFound), StatusCode::NOT_FOUND),
            (AppError::from(EpigramError::PermissionDenied), StatusCode::FORBIDDEN),
            (AppError::from(EpigramError::Duplicate), StatusCode::CONFLICT),
            (AppError::from(UserTableError::UsernameExists), StatusCode::BAD_REQUEST),
            (AppError::invalid_input("text", "empty"), StatusCode::BAD_REQUEST),
            (AppError::InvalidCredentials, StatusCode::UNAUTHORIZED),
            (AppError::DatabaseError, StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, expected) in cases {
            assert_eq!(err.status_code(), expected, "{:?}", err);
        }
    }

    #[test]
    fn test_settings_interval_maps_to_invalid_input() {
        let err = AppError::from(SettingsError::IntervalOutOfRange(0));
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[actix_rt::test]
    async fn test_error_body_shape() {
        let resp = AppError::from(EpigramError::Duplicate).error_response();
        let body = to_bytes(resp.into_body()).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"]["code"], "CONFLICT");
        assert!(json["error"]["message"].as_str().unwrap().contains("already exists"));
    }
}
