//! User accounts and bearer tokens for the feedback board.
//!
//! This crate:
//! - Stores user records with bcrypt-hashed passwords
//! - Issues and verifies the JWTs that carry identity claims
//! - Implements the create-or-authenticate login flow

pub mod error;
pub mod service;
pub mod token;
pub mod users;

pub use error::{AuthError, Result};
pub use service::{AuthService, LoginOutcome};
pub use token::{Claims, TokenService, DEFAULT_TOKEN_TTL_HOURS};
pub use users::{PublicUser, User, UserStore};
