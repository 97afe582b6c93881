//! Feedback submission orchestration.

use crate::error::{FeedbackError, Result};
use crate::model::{Feedback, FeedbackNotification, NewFeedback};
use crate::store::FeedbackStore;
use auth::UserStore;
use gateway::ClientRegistry;
use metrics::counter;
use std::sync::Arc;
use tracing::info;

/// Ties submission together: validation, persistence, then realtime
/// notification of the admin audience.
pub struct FeedbackService {
    store: Arc<FeedbackStore>,
    users: Arc<UserStore>,
    registry: Arc<ClientRegistry>,
}

impl FeedbackService {
    pub fn new(
        store: Arc<FeedbackStore>,
        users: Arc<UserStore>,
        registry: Arc<ClientRegistry>,
    ) -> Self {
        Self {
            store,
            users,
            registry,
        }
    }

    pub fn store(&self) -> &FeedbackStore {
        &self.store
    }

    /// Accept a submission from an authenticated user.
    ///
    /// Persistence is the commit point: the broadcast runs after the entry
    /// is stored and cannot fail the submission. An undeliverable
    /// notification is the recipient's loss, not the submitter's error.
    pub fn submit(&self, submission: NewFeedback, user_id: i64) -> Result<Feedback> {
        submission.validate()?;

        let user = self
            .users
            .find_by_id(user_id)
            .ok_or(FeedbackError::UserNotFound(user_id))?;

        let feedback = self.store.create(submission, &user);
        counter!("feedback_submissions_total").increment(1);
        info!(
            "Feedback {} submitted by {} ({})",
            feedback.id, user.username, user_id
        );

        let notification = FeedbackNotification::new(&feedback, user.to_public());
        self.registry.broadcast_to_admins(&notification);

        Ok(feedback)
    }
}
