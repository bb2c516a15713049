use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::fmt;

/// Everything that can go wrong between an HTTP request and the completion record
#[derive(Debug)]
pub enum AppError {
    /// Date input that is not a real `YYYY-MM-DD` date
    InvalidDate(String),
    /// Period outside 1..=7
    InvalidPeriod(i64),
    InvalidMonth(String),
    /// Persisted completion record that does not match the expected shape
    CorruptRecord(String),
    Storage(rusqlite::Error),
    Serialization(serde_json::Error),
    /// A previous request panicked while holding the session lock
    StatePoisoned,
    Config(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidDate(_) | AppError::InvalidPeriod(_) | AppError::InvalidMonth(_) => {
                StatusCode::BAD_REQUEST
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::InvalidDate(input) => write!(f, "invalid date '{}', expected YYYY-MM-DD", input),
            AppError::InvalidPeriod(period) => write!(f, "invalid period {}, expected 1..=7", period),
            AppError::InvalidMonth(reason) => write!(f, "invalid month: {}", reason),
            AppError::CorruptRecord(reason) => write!(f, "corrupt completion record: {}", reason),
            AppError::Storage(e) => write!(f, "storage error: {}", e),
            AppError::Serialization(e) => write!(f, "serialization error: {}", e),
            AppError::StatePoisoned => write!(f, "session state is poisoned"),
            AppError::Config(reason) => write!(f, "configuration error: {}", reason),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Storage(e) => Some(e),
            AppError::Serialization(e) => Some(e),
            _ => None,
        }
    }
}

impl From<rusqlite::Error> for AppError {
    fn from(e: rusqlite::Error) -> Self {
        AppError::Storage(e)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(e: serde_json::Error) -> Self {
        AppError::Serialization(e)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("request failed: {}", self);
        } else {
            tracing::debug!("rejected request: {}", self);
        }

        let body = Json(serde_json::json!({
            "status": "error",
            "message": self.to_string(),
        }));
        (status, body).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
