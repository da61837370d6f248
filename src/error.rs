use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Unified error type for the attendance domain and its stores.
///
/// Business-rule violations are expected outcomes and map to 4xx responses;
/// only `Storage` is treated as unexpected and hidden behind a generic 500.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Already checked in today")]
    AlreadyCheckedIn,

    #[error("Not checked in today")]
    NotCheckedIn,

    #[error("Already checked out today")]
    AlreadyCheckedOut,

    #[error("Check-out time precedes check-in time")]
    NegativeDuration,

    /// Uniqueness violation on (user_id, date). The attendance service
    /// re-reads and re-derives a user-visible error before this can
    /// surface, so callers only ever see it when the retry budget runs out.
    #[error("Attendance record already exists for this day")]
    Conflict,

    #[error("Start date must not be after end date")]
    InvalidRange,

    #[error("Email already registered")]
    EmailTaken,

    #[error("User not found")]
    UserNotFound,

    #[error("{0}")]
    Validation(String),

    #[error("storage error: {0}")]
    Storage(#[from] sqlx::Error),
}

impl ResponseError for Error {
    fn status_code(&self) -> StatusCode {
        match self {
            Error::AlreadyCheckedIn
            | Error::NotCheckedIn
            | Error::AlreadyCheckedOut
            | Error::NegativeDuration
            | Error::InvalidRange
            | Error::Validation(_) => StatusCode::BAD_REQUEST,
            Error::Conflict | Error::EmailTaken => StatusCode::CONFLICT,
            Error::UserNotFound => StatusCode::NOT_FOUND,
            Error::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            Error::Storage(e) => {
                error!(error = %e, "storage failure");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        HttpResponse::build(self.status_code()).json(json!({
            "success": false,
            "message": message
        }))
    }
}
