use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::fmt;

/// Application-specific error types.
#[derive(Debug)]
pub enum AppError {
    /// Database-related errors.
    DatabaseError(sqlx::Error),
    /// Resource not found error.
    NotFound(String),
    /// Bad request error (invalid input).
    BadRequest(String),
    /// Error interacting with an external API (LLM, notification webhook).
    ExternalApiError(String),
    /// Error with context chain for better debugging.
    WithContext {
        /// The underlying source of the error.
        source: Box<AppError>,
        /// Additional context message.
        context: String,
    },
}

impl AppError {
    /// HTTP status and client-facing message for this error.
    ///
    /// Database and internal details stay in the logs; clients only see a flat message.
    fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            AppError::DatabaseError(e) => {
                tracing::error!("Database error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Database error".to_string(),
                )
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::ExternalApiError(msg) => {
                tracing::error!("External API error: {}", msg);
                (
                    StatusCode::BAD_GATEWAY,
                    "External service error".to_string(),
                )
            }
            AppError::WithContext { source, context } => {
                tracing::error!("Error with context: {} -> {}", context, source);
                source.status_and_message()
            }
        }
    }
}

impl fmt::Display for AppError {
    /// Formats the error for display.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::DatabaseError(e) => write!(f, "Database error: {}", e),
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            AppError::ExternalApiError(msg) => write!(f, "External API error: {}", msg),
            AppError::WithContext { source, context } => {
                write!(f, "{}: {}", context, source)
            }
        }
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    /// Converts the error into an HTTP response with a `{"error": ...}` body.
    fn into_response(self) -> Response {
        let (status, error_message) = self.status_and_message();

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::DatabaseError(err)
    }
}

/// Extension trait for adding context to errors.
/// Similar to `anyhow::Context` but for our `AppError` type.
pub trait ResultExt<T> {
    /// Add context to an error.
    fn context(self, context: impl Into<String>) -> Result<T, AppError>;

    /// Add context lazily (only evaluated on error).
    fn with_context<F>(self, f: F) -> Result<T, AppError>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T, AppError> {
    fn context(self, context: impl Into<String>) -> Result<T, AppError> {
        self.map_err(|e| AppError::WithContext {
            source: Box::new(e),
            context: context.into(),
        })
    }

    fn with_context<F>(self, f: F) -> Result<T, AppError>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| AppError::WithContext {
            source: Box::new(e),
            context: f(),
        })
    }
}

/// Extension for sqlx::Error to add context
impl<T> ResultExt<T> for Result<T, sqlx::Error> {
    fn context(self, context: impl Into<String>) -> Result<T, AppError> {
        self.map_err(|e| AppError::WithContext {
            source: Box::new(AppError::DatabaseError(e)),
            context: context.into(),
        })
    }

    fn with_context<F>(self, f: F) -> Result<T, AppError>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| AppError::WithContext {
            source: Box::new(AppError::DatabaseError(e)),
            context: f(),
        })
    }
}
