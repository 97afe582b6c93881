//! User records and the in-memory credential store.
//!
//! Uses DashMap for concurrent access: the login path and the feedback
//! orchestrator hit the store from independent request tasks.

use crate::error::{AuthError, Result};
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::Serialize;
use std::sync::atomic::{AtomicI64, Ordering};

/// A stored user record.
///
/// The password hash never crosses an API boundary; anything leaving this
/// crate goes through [`PublicUser`].
#[derive(Debug, Clone)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Redacted view safe for responses and broadcast payloads.
    pub fn to_public(&self) -> PublicUser {
        PublicUser {
            id: self.id,
            username: self.username.clone(),
            is_admin: self.is_admin,
        }
    }
}

/// Redacted user view: id, username, admin flag. Never the credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublicUser {
    pub id: i64,
    pub username: String,
    #[serde(rename = "isAdmin")]
    pub is_admin: bool,
}

/// Concurrent user store keyed by id with a username index.
pub struct UserStore {
    users: DashMap<i64, User>,
    by_username: DashMap<String, i64>,
    next_id: AtomicI64,
}

impl UserStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self {
            users: DashMap::new(),
            by_username: DashMap::new(),
            next_id: AtomicI64::new(1),
        }
    }

    /// Insert a new user. Fails when the username is already taken.
    ///
    /// The username index entry is held while inserting, so two racing
    /// registrations for the same name resolve to exactly one winner.
    pub fn create(&self, username: &str, password_hash: String, is_admin: bool) -> Result<User> {
        match self.by_username.entry(username.to_string()) {
            Entry::Occupied(_) => Err(AuthError::UsernameTaken(username.to_string())),
            Entry::Vacant(slot) => {
                let id = self.next_id.fetch_add(1, Ordering::Relaxed);
                let now = Utc::now();
                let user = User {
                    id,
                    username: username.to_string(),
                    password_hash,
                    is_admin,
                    created_at: now,
                    updated_at: now,
                };
                self.users.insert(id, user.clone());
                slot.insert(id);
                Ok(user)
            }
        }
    }

    /// Look a user up by username.
    pub fn find_by_username(&self, username: &str) -> Option<User> {
        let id = *self.by_username.get(username)?;
        self.users.get(&id).map(|u| u.clone())
    }

    /// Look a user up by id.
    pub fn find_by_id(&self, id: i64) -> Option<User> {
        self.users.get(&id).map(|u| u.clone())
    }

    /// Number of registered users.
    pub fn user_count(&self) -> usize {
        self.users.len()
    }
}

impl Default for UserStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_assigns_sequential_ids() {
        let store = UserStore::new();
        let a = store.create("ada", "hash-a".to_string(), false).unwrap();
        let b = store.create("bob", "hash-b".to_string(), false).unwrap();
        assert_eq!(a.id, 1);
        assert_eq!(b.id, 2);
        assert_eq!(store.user_count(), 2);
    }

    #[test]
    fn duplicate_username_is_rejected() {
        let store = UserStore::new();
        store.create("ada", "hash".to_string(), false).unwrap();
        let err = store.create("ada", "hash2".to_string(), false).unwrap_err();
        assert!(matches!(err, AuthError::UsernameTaken(_)));
        assert_eq!(store.user_count(), 1);
    }

    #[test]
    fn lookup_by_username_and_id() {
        let store = UserStore::new();
        let created = store.create("ada", "hash".to_string(), true).unwrap();

        let by_name = store.find_by_username("ada").unwrap();
        assert_eq!(by_name.id, created.id);
        assert!(by_name.is_admin);

        let by_id = store.find_by_id(created.id).unwrap();
        assert_eq!(by_id.username, "ada");

        assert!(store.find_by_username("nobody").is_none());
        assert!(store.find_by_id(999).is_none());
    }

    #[test]
    fn public_view_redacts_the_hash() {
        let store = UserStore::new();
        let user = store.create("ada", "hash".to_string(), false).unwrap();
        let public = user.to_public();
        let json = serde_json::to_value(&public).unwrap();
        assert_eq!(json["username"], "ada");
        assert_eq!(json["isAdmin"], false);
        assert!(json.get("passwordHash").is_none());
        assert!(json.get("password_hash").is_none());
    }

    #[test]
    fn concurrent_registrations_pick_one_winner() {
        use std::sync::Arc;
        use std::thread;

        let store = Arc::new(UserStore::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = store.clone();
                thread::spawn(move || store.create("ada", "hash".to_string(), false).is_ok())
            })
            .collect();

        let wins = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|won| *won)
            .count();
        assert_eq!(wins, 1);
        assert_eq!(store.user_count(), 1);
    }
}
