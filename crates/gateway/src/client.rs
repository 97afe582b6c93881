//! Connection state and the admin-audience registry.
//!
//! Uses DashMap for concurrent access: each connection's task mutates only
//! its own state, while connect/disconnect storms hit the shared maps.

use crate::protocol::NotificationEvent;
use auth::Claims;
use axum::extract::ws::Message;
use chrono::Utc;
use dashmap::{DashMap, DashSet};
use metrics::counter;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Unique connection identifier, valid for the connection's lifetime.
pub type ConnectionId = Uuid;

/// The room feedback notifications fan out to.
pub const ADMIN_ROOM: &str = "admin-room";

/// Outbound buffer per connection. A full buffer drops the frame rather
/// than blocking the broadcaster on a slow client.
pub const CLIENT_CHANNEL_BUFFER_SIZE: usize = 256;

/// Who a connection is.
///
/// Resolved once at connection establishment and immutable afterwards;
/// every downstream check is a total match over the two variants.
#[derive(Debug, Clone)]
pub enum ConnectionIdentity {
    Anonymous,
    Authenticated(Claims),
}

impl ConnectionIdentity {
    /// Whether the identity carries the admin flag.
    pub fn is_admin(&self) -> bool {
        matches!(self, ConnectionIdentity::Authenticated(claims) if claims.is_admin)
    }

    /// Display name for logs.
    pub fn username(&self) -> &str {
        match self {
            ConnectionIdentity::Anonymous => "Anonymous",
            ConnectionIdentity::Authenticated(claims) => &claims.username,
        }
    }
}

/// State for a single live connection.
pub struct ClientState {
    /// Unique connection identifier.
    pub id: ConnectionId,
    /// Fixed at connect time; there is deliberately no way to change it.
    pub identity: ConnectionIdentity,
    /// Channel to the connection's WebSocket writer task.
    pub tx: mpsc::Sender<Message>,
    /// Timestamp when the connection was established, epoch millis.
    pub connected_at: i64,
}

impl ClientState {
    /// Create connection state with an already-resolved identity.
    pub fn new(identity: ConnectionIdentity, tx: mpsc::Sender<Message>) -> Self {
        Self {
            id: Uuid::new_v4(),
            identity,
            tx,
            connected_at: Utc::now().timestamp_millis(),
        }
    }

    /// Queue a pre-serialized frame. Non-blocking; returns false when the
    /// buffer is full or the writer task is gone.
    pub fn try_send_text(&self, json: &str) -> bool {
        self.tx.try_send(Message::Text(json.to_owned().into())).is_ok()
    }
}

/// Registry of live connections and room membership.
///
/// Owned by the server instance and passed by handle to whatever needs to
/// trigger a broadcast; there is no ambient global.
pub struct ClientRegistry {
    /// Connection ID → connection state.
    clients: DashMap<ConnectionId, Arc<ClientState>>,
    /// Room name → member connection IDs.
    rooms: DashMap<String, DashSet<ConnectionId>>,
}

impl ClientRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            clients: DashMap::new(),
            rooms: DashMap::new(),
        }
    }

    /// Track a new connection. Its identity must already be resolved.
    pub fn register(&self, client: Arc<ClientState>) -> ConnectionId {
        let id = client.id;
        self.clients.insert(id, client);
        counter!("gateway_connections_total").increment(1);
        id
    }

    /// Drop a connection and every room membership it held.
    ///
    /// Idempotent: a second call for the same id is a no-op and never
    /// touches other connections.
    pub fn unregister(&self, id: &ConnectionId) {
        for room in self.rooms.iter() {
            room.value().remove(id);
        }
        if self.clients.remove(id).is_some() {
            counter!("gateway_disconnections_total").increment(1);
        }
    }

    /// Get a connection by id.
    pub fn get(&self, id: &ConnectionId) -> Option<Arc<ClientState>> {
        self.clients.get(id).map(|c| c.clone())
    }

    /// The sole authorization checkpoint for realtime admin visibility.
    ///
    /// Granted iff the connection authenticated with the admin flag; any
    /// other state (anonymous, failed token, non-admin) is denied without
    /// mutation. Denial is a normal return value, never an error.
    pub fn join_admin_room(&self, id: &ConnectionId) -> bool {
        let Some(client) = self.get(id) else {
            return false;
        };
        if !client.identity.is_admin() {
            debug!(
                "Denied {} request from {} ({})",
                ADMIN_ROOM,
                client.identity.username(),
                id
            );
            return false;
        }
        self.rooms
            .entry(ADMIN_ROOM.to_string())
            .or_default()
            .insert(*id);
        info!("Admin {} joined {} ({})", client.identity.username(), ADMIN_ROOM, id);
        true
    }

    /// Whether a connection is currently a member of a room.
    pub fn is_member(&self, room: &str, id: &ConnectionId) -> bool {
        self.rooms.get(room).is_some_and(|members| members.contains(id))
    }

    /// Snapshot the live members of a room.
    fn room_members(&self, room: &str) -> Vec<Arc<ClientState>> {
        let Some(members) = self.rooms.get(room) else {
            return Vec::new();
        };
        members.iter().filter_map(|id| self.get(&id)).collect()
    }

    /// Fan a feedback payload out to every admin currently in the room.
    ///
    /// The event is serialized once and unicast to the membership snapshot
    /// taken at emission; a join or leave racing this call sees either the
    /// whole event or nothing. Fire-and-forget: per-member failures are
    /// logged at debug and never surfaced to the caller.
    pub fn broadcast_to_admins<T: Serialize>(&self, payload: &T) {
        let members = self.room_members(ADMIN_ROOM);
        if members.is_empty() {
            return;
        }

        let event = NotificationEvent::new_feedback(payload);
        let json = match serde_json::to_string(&event) {
            Ok(json) => json,
            Err(e) => {
                warn!("Failed to serialize notification: {}", e);
                return;
            }
        };

        for client in &members {
            if !client.try_send_text(&json) {
                debug!("Dropped notification for connection {}", client.id);
            }
        }

        counter!("gateway_notifications_total").increment(1);
        debug!("Notified {} admin connection(s)", members.len());
    }

    /// Total number of live connections.
    pub fn client_count(&self) -> usize {
        self.clients.len()
    }

    /// Number of connections currently in the admin room.
    pub fn admin_count(&self) -> usize {
        self.rooms.get(ADMIN_ROOM).map_or(0, |members| members.len())
    }
}

impl Default for ClientRegistry {
    fn default() -> Self {
        Self::new()
    }
}
