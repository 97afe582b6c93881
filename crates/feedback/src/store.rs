//! In-memory feedback store.

use crate::error::{FeedbackError, Result};
use crate::model::{Feedback, NewFeedback};
use auth::User;
use chrono::Utc;
use dashmap::DashMap;
use std::sync::atomic::{AtomicI64, Ordering};

/// Concurrent feedback store keyed by entry id.
pub struct FeedbackStore {
    entries: DashMap<i64, Feedback>,
    next_id: AtomicI64,
}

impl FeedbackStore {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
            next_id: AtomicI64::new(1),
        }
    }

    /// Persist a validated submission on behalf of a user.
    pub fn create(&self, submission: NewFeedback, user: &User) -> Feedback {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let now = Utc::now();
        let feedback = Feedback {
            id,
            name: submission.name,
            message: submission.message,
            category: submission.category,
            username: user.username.clone(),
            is_inappropriate: false,
            created_at: now,
            updated_at: now,
            user_id: user.id,
        };
        self.entries.insert(id, feedback.clone());
        feedback
    }

    /// All entries, newest first. Ties on the timestamp fall back to the
    /// id so the order is stable.
    pub fn list_all(&self) -> Vec<Feedback> {
        let mut entries: Vec<Feedback> =
            self.entries.iter().map(|e| e.value().clone()).collect();
        entries.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        entries
    }

    /// A single user's entries, newest first.
    pub fn list_by_user(&self, user_id: i64) -> Vec<Feedback> {
        let mut entries: Vec<Feedback> = self
            .entries
            .iter()
            .filter(|e| e.value().user_id == user_id)
            .map(|e| e.value().clone())
            .collect();
        entries.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        entries
    }

    /// Look up a single entry.
    pub fn get(&self, id: i64) -> Option<Feedback> {
        self.entries.get(&id).map(|e| e.clone())
    }

    /// Flag an entry as inappropriate.
    pub fn mark_inappropriate(&self, id: i64) -> Result<Feedback> {
        let mut entry = self.entries.get_mut(&id).ok_or(FeedbackError::NotFound(id))?;
        entry.is_inappropriate = true;
        entry.updated_at = Utc::now();
        Ok(entry.clone())
    }

    /// Remove an entry.
    pub fn delete(&self, id: i64) -> Result<()> {
        self.entries
            .remove(&id)
            .map(|_| ())
            .ok_or(FeedbackError::NotFound(id))
    }

    /// Number of stored entries.
    pub fn feedback_count(&self) -> usize {
        self.entries.len()
    }
}

impl Default for FeedbackStore {
    fn default() -> Self {
        Self::new()
    }
}
