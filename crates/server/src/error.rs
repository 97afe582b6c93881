//! REST error responses.

use auth::AuthError;
use axum::{http::StatusCode, response::IntoResponse, Json};
use feedback::FeedbackError;
use serde::Serialize;

/// API error, status-classified. Converts into a JSON `{message, error}`
/// body matching the existing frontend contract.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Unauthorized(String),
    Forbidden(String),
    NotFound(String),
    Internal(String),
}

#[derive(Serialize)]
struct ErrorResponse {
    message: String,
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(ErrorResponse {
            message,
            error: status
                .canonical_reason()
                .unwrap_or("Unknown")
                .to_string(),
        });

        (status, body).into_response()
    }
}

impl From<FeedbackError> for ApiError {
    fn from(err: FeedbackError) -> Self {
        match err {
            FeedbackError::Validation(msg) => ApiError::BadRequest(msg),
            FeedbackError::UserNotFound(_) => {
                // The submitter authenticated but no longer exists.
                ApiError::Unauthorized("Invalid token".to_string())
            }
            FeedbackError::NotFound(_) => ApiError::NotFound("Feedback not found".to_string()),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            // Never reveal which part of the credential was wrong.
            AuthError::InvalidCredentials
            | AuthError::UsernameTaken(_)
            | AuthError::Token(_) => ApiError::Unauthorized("Invalid credentials".to_string()),
            AuthError::UserNotFound(_) => ApiError::Unauthorized("Invalid token".to_string()),
            AuthError::Hash(_) => ApiError::Internal("Internal server error".to_string()),
        }
    }
}
