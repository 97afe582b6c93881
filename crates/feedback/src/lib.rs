//! Feedback domain: submission validation, in-memory persistence, and the
//! hand-off to the realtime gateway.

pub mod error;
pub mod model;
pub mod service;
pub mod store;

pub use error::{FeedbackError, Result};
pub use model::{Feedback, FeedbackNotification, NewFeedback, MAX_CATEGORY_LEN, MAX_NAME_LEN};
pub use service::FeedbackService;
pub use store::FeedbackStore;
