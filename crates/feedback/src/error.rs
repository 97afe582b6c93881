//! Feedback error types.

use thiserror::Error;

/// Feedback error type.
#[derive(Debug, Error)]
pub enum FeedbackError {
    /// Submission rejected by input validation.
    #[error("{0}")]
    Validation(String),

    /// The submitting user does not exist.
    #[error("User not found")]
    UserNotFound(i64),

    /// No feedback entry with the given id.
    #[error("Feedback not found")]
    NotFound(i64),
}

/// Result type for feedback operations.
pub type Result<T> = std::result::Result<T, FeedbackError>;
