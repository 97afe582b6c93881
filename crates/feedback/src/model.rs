//! Feedback entries and the submission payload.

use crate::error::{FeedbackError, Result};
use auth::PublicUser;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Maximum accepted length for the submitter's display name.
pub const MAX_NAME_LEN: usize = 100;
/// Maximum accepted length for the category label.
pub const MAX_CATEGORY_LEN: usize = 50;

/// A stored feedback entry.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Feedback {
    pub id: i64,
    /// Display name given at submission, independent of the account name.
    pub name: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Account name of the submitter, denormalized at creation.
    pub username: String,
    pub is_inappropriate: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub user_id: i64,
}

/// Incoming submission payload.
#[derive(Debug, Clone, Deserialize)]
pub struct NewFeedback {
    pub name: String,
    pub message: String,
    #[serde(default)]
    pub category: Option<String>,
}

impl NewFeedback {
    /// Check field presence and length limits.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(FeedbackError::Validation("name should not be empty".into()));
        }
        if self.name.len() > MAX_NAME_LEN {
            return Err(FeedbackError::Validation(format!(
                "name must be shorter than or equal to {} characters",
                MAX_NAME_LEN
            )));
        }
        if self.message.trim().is_empty() {
            return Err(FeedbackError::Validation(
                "message should not be empty".into(),
            ));
        }
        if let Some(category) = &self.category {
            if category.len() > MAX_CATEGORY_LEN {
                return Err(FeedbackError::Validation(format!(
                    "category must be shorter than or equal to {} characters",
                    MAX_CATEGORY_LEN
                )));
            }
        }
        Ok(())
    }
}

/// Payload pushed to the admin audience when feedback is created.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackNotification {
    pub id: i64,
    pub name: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub username: String,
    pub created_at: DateTime<Utc>,
    pub user: PublicUser,
}

impl FeedbackNotification {
    pub fn new(feedback: &Feedback, user: PublicUser) -> Self {
        Self {
            id: feedback.id,
            name: feedback.name.clone(),
            message: feedback.message.clone(),
            category: feedback.category.clone(),
            username: feedback.username.clone(),
            created_at: feedback.created_at,
            user,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn submission(name: &str, message: &str, category: Option<&str>) -> NewFeedback {
        NewFeedback {
            name: name.to_string(),
            message: message.to_string(),
            category: category.map(str::to_string),
        }
    }

    #[test]
    fn a_plain_submission_validates() {
        assert!(submission("Ada", "Great site", Some("compliment"))
            .validate()
            .is_ok());
        assert!(submission("Ada", "Great site", None).validate().is_ok());
    }

    #[test]
    fn empty_and_whitespace_fields_are_rejected() {
        assert!(submission("", "Great site", None).validate().is_err());
        assert!(submission("   ", "Great site", None).validate().is_err());
        assert!(submission("Ada", "", None).validate().is_err());
    }

    #[test]
    fn length_limits_are_enforced() {
        assert!(submission(&"x".repeat(MAX_NAME_LEN), "hi", None)
            .validate()
            .is_ok());
        assert!(submission(&"x".repeat(MAX_NAME_LEN + 1), "hi", None)
            .validate()
            .is_err());
        assert!(
            submission("Ada", "hi", Some(&"x".repeat(MAX_CATEGORY_LEN + 1)))
                .validate()
                .is_err()
        );
    }

    #[test]
    fn stored_entries_serialize_with_camel_case_fields() {
        let now = Utc::now();
        let feedback = Feedback {
            id: 1,
            name: "Ada".to_string(),
            message: "Great site".to_string(),
            category: None,
            username: "ada".to_string(),
            is_inappropriate: false,
            created_at: now,
            updated_at: now,
            user_id: 3,
        };
        let value = serde_json::to_value(&feedback).unwrap();
        assert_eq!(value["isInappropriate"], false);
        assert_eq!(value["userId"], 3);
        assert!(value["createdAt"].is_string());
        // Absent category is omitted, not null.
        assert!(value.get("category").is_none());
    }
}
