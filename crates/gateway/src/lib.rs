//! Realtime gateway: WebSocket connections, the admin audience, and
//! feedback notification fan-out.
//!
//! This crate:
//! - Accepts WebSocket connections with connect-time identity resolution
//! - Manages the admin room behind a single authorization checkpoint
//! - Broadcasts NEW_FEEDBACK events to the admin audience
//!
//! ## Architecture
//!
//! ```text
//! FeedbackService (REST submission)
//!         ↓
//! ClientRegistry (DashMap-based, lock-free)
//!         ↓
//! admin-room members (WebSocket clients)
//! ```
//!
//! ## Delivery Design
//!
//! - Identity fixed before the protocol upgrade, immutable afterwards
//! - Events serialized once per broadcast, not once per recipient
//! - Membership snapshot taken at emission; no partial events
//! - Fire-and-forget: no queueing, no retries, no offline delivery

pub mod client;
pub mod error;
pub mod protocol;
pub mod ws_server;

pub use client::{
    ClientRegistry, ClientState, ConnectionId, ConnectionIdentity, ADMIN_ROOM,
    CLIENT_CHANNEL_BUFFER_SIZE,
};
pub use error::{GatewayError, Result};
pub use protocol::{ClientMessage, NotificationEvent, ServerMessage, NEW_FEEDBACK};
pub use ws_server::{ws_routes, GatewayState};
