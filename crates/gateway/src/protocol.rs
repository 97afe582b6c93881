//! Wire protocol for the realtime channel.
//!
//! Defines the JSON message format for client-server communication.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Type tag carried by every feedback notification envelope.
pub const NEW_FEEDBACK: &str = "NEW_FEEDBACK";

// ============================================================================
// Client → Server Messages
// ============================================================================

/// Message sent from client to server.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ClientMessage {
    /// Request membership in the admin audience.
    JoinAdminRoom,
    /// Echo diagnostic, usable as an application-level liveness check.
    Message {
        #[serde(default)]
        payload: Option<serde_json::Value>,
    },
    /// Keepalive.
    Ping,
}

// ============================================================================
// Server → Client Messages
// ============================================================================

/// Message sent from server to client.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ServerMessage {
    /// Outcome of a join-admin-room request. Denial is a normal reply, not
    /// an error, and never closes the connection.
    JoinResult { success: bool, message: String },
    /// Reply to the echo diagnostic.
    Message { message: String },
    /// Reply to an application-level ping.
    Pong,
    /// Something went wrong handling an inbound frame.
    Error { message: String, code: String },
}

impl ServerMessage {
    pub fn join_granted() -> Self {
        ServerMessage::JoinResult {
            success: true,
            message: "Joined admin room".to_string(),
        }
    }

    pub fn join_denied() -> Self {
        ServerMessage::JoinResult {
            success: false,
            message: "Access denied".to_string(),
        }
    }
}

// ============================================================================
// Notification Envelope
// ============================================================================

/// Envelope pushed to the admin audience when feedback is created.
///
/// Not queued, not retried, not stored: an admin who is not connected when
/// the event fires never sees it.
#[derive(Debug, Clone, Serialize)]
pub struct NotificationEvent<'a, T> {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub data: &'a T,
    /// Emission time, RFC 3339.
    pub timestamp: String,
}

impl<'a, T: Serialize> NotificationEvent<'a, T> {
    /// Wrap a payload in a NEW_FEEDBACK envelope stamped with the current
    /// time.
    pub fn new_feedback(data: &'a T) -> Self {
        Self {
            kind: NEW_FEEDBACK,
            data,
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}
