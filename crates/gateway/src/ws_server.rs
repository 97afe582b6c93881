//! WebSocket server handler using Axum.
//!
//! Identity is resolved from the connect-time credential, before the
//! protocol upgrade. A missing or invalid token downgrades the connection
//! to anonymous instead of rejecting it; authorization happens later, per
//! request, against the immutable identity.

use crate::client::{
    ClientRegistry, ClientState, ConnectionIdentity, CLIENT_CHANNEL_BUFFER_SIZE,
};
use crate::error::{GatewayError, Result};
use crate::protocol::{ClientMessage, ServerMessage};
use auth::TokenService;
use axum::{
    extract::{
        ws::{Message, WebSocket},
        Query, State, WebSocketUpgrade,
    },
    http::HeaderMap,
    response::IntoResponse,
    routing::get,
    Router,
};
use futures::{SinkExt, StreamExt};
use metrics::gauge;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::interval;
use tracing::{debug, info, warn};

/// Shared state for the realtime endpoint.
pub struct GatewayState {
    pub registry: Arc<ClientRegistry>,
    pub tokens: Arc<TokenService>,
}

/// Create the WebSocket router.
pub fn ws_routes(state: Arc<GatewayState>) -> Router {
    Router::new().route("/ws", get(ws_handler)).with_state(state)
}

/// Connect-time query parameters.
#[derive(Debug, Deserialize)]
struct ConnectQuery {
    token: Option<String>,
}

/// WebSocket upgrade handler.
///
/// The identity is fixed here, before the upgrade completes, so the
/// message loop never observes a connection whose identity is pending.
async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(query): Query<ConnectQuery>,
    headers: HeaderMap,
    State(state): State<Arc<GatewayState>>,
) -> impl IntoResponse {
    let identity = resolve_identity(&state.tokens, query.token.as_deref(), &headers);
    ws.on_upgrade(move |socket| handle_socket(socket, state, identity))
}

/// Resolve the connection identity from a query token or bearer header.
///
/// Fail-open: any outcome other than a verified token yields an anonymous
/// connection. The failure is logged and otherwise indistinguishable, to
/// the client, from presenting no credential at all.
fn resolve_identity(
    tokens: &TokenService,
    query_token: Option<&str>,
    headers: &HeaderMap,
) -> ConnectionIdentity {
    let Some(token) = query_token.or_else(|| bearer_token(headers)) else {
        return ConnectionIdentity::Anonymous;
    };
    match tokens.verify(token) {
        Ok(claims) => ConnectionIdentity::Authenticated(claims),
        Err(e) => {
            debug!("Connection presented an invalid token: {}", e);
            ConnectionIdentity::Anonymous
        }
    }
}

/// Extract a bearer token from the Authorization header.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(axum::http::header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

/// Handle a WebSocket connection.
async fn handle_socket(socket: WebSocket, state: Arc<GatewayState>, identity: ConnectionIdentity) {
    // Split the socket into sender and receiver
    let (mut ws_tx, mut ws_rx) = socket.split();

    // Bounded channel for outgoing messages
    let (tx, mut rx) = mpsc::channel::<Message>(CLIENT_CHANNEL_BUFFER_SIZE);

    let client = Arc::new(ClientState::new(identity, tx));
    let client_id = state.registry.register(client.clone());

    gauge!("gateway_active_connections").set(state.registry.client_count() as f64);

    info!(
        "Client {} connected as {}",
        client_id,
        client.identity.username()
    );

    // Spawn task to forward messages from channel to WebSocket
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if ws_tx.send(msg).await.is_err() {
                break;
            }
        }
    });

    // Ping interval for keepalive
    let mut ping_interval = interval(Duration::from_secs(30));
    ping_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    // Handle incoming messages
    loop {
        tokio::select! {
            biased;

            // Handle incoming WebSocket messages
            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(msg)) => {
                        if let Err(e) = handle_message(&state, &client, msg) {
                            warn!("Error handling message from {}: {:?}", client_id, e);
                            // Send error to client
                            let _ = send(&client, &ServerMessage::Error {
                                message: e.to_string(),
                                code: "PROCESSING_ERROR".to_string(),
                            });
                        }
                    }
                    Some(Err(e)) => {
                        warn!("WebSocket error for {}: {:?}", client_id, e);
                        break;
                    }
                    None => {
                        // Connection closed
                        break;
                    }
                }
            }

            // Send ping periodically
            _ = ping_interval.tick() => {
                if client.tx.try_send(Message::Ping(vec![].into())).is_err() {
                    break;
                }
            }
        }
    }

    // Cleanup
    state.registry.unregister(&client_id);
    send_task.abort();

    gauge!("gateway_active_connections").set(state.registry.client_count() as f64);

    info!("Client {} disconnected", client_id);
}

/// Serialize and queue a reply on the connection's outbound channel.
fn send(client: &ClientState, msg: &ServerMessage) -> Result<()> {
    let json = serde_json::to_string(msg)?;
    if !client.try_send_text(&json) {
        return Err(GatewayError::ChannelSend);
    }
    Ok(())
}

/// Handle a single WebSocket message.
fn handle_message(state: &Arc<GatewayState>, client: &Arc<ClientState>, msg: Message) -> Result<()> {
    match msg {
        Message::Text(text) => {
            let client_msg: ClientMessage = serde_json::from_str(&text)?;
            handle_client_message(state, client, client_msg)
        }
        Message::Binary(data) => {
            // Try to parse as JSON
            let client_msg: ClientMessage = serde_json::from_slice(&data)?;
            handle_client_message(state, client, client_msg)
        }
        Message::Ping(data) => {
            client
                .tx
                .try_send(Message::Pong(data))
                .map_err(|_| GatewayError::ChannelSend)?;
            Ok(())
        }
        Message::Pong(_) => Ok(()),
        Message::Close(_) => {
            // Will be handled by the connection loop
            Ok(())
        }
    }
}

/// Handle a parsed client message.
fn handle_client_message(
    state: &Arc<GatewayState>,
    client: &Arc<ClientState>,
    msg: ClientMessage,
) -> Result<()> {
    match msg {
        ClientMessage::JoinAdminRoom => {
            debug!("Client {} requested admin room membership", client.id);

            let reply = if state.registry.join_admin_room(&client.id) {
                ServerMessage::join_granted()
            } else {
                ServerMessage::join_denied()
            };
            send(client, &reply)
        }
        ClientMessage::Message { payload } => {
            debug!("Client {} sent echo message: {:?}", client.id, payload);
            send(
                client,
                &ServerMessage::Message {
                    message: "Hello world!".to_string(),
                },
            )
        }
        ClientMessage::Ping => send(client, &ServerMessage::Pong),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use auth::{TokenService, User};
    use chrono::Utc;

    fn token_service() -> TokenService {
        TokenService::new("test-secret", 24)
    }

    fn user(id: i64, username: &str, is_admin: bool) -> User {
        let now = Utc::now();
        User {
            id,
            username: username.to_string(),
            password_hash: String::new(),
            is_admin,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn identity_is_anonymous_without_a_credential() {
        let identity = resolve_identity(&token_service(), None, &HeaderMap::new());
        assert!(matches!(identity, ConnectionIdentity::Anonymous));
    }

    #[test]
    fn identity_is_anonymous_for_a_garbage_token() {
        let identity =
            resolve_identity(&token_service(), Some("not-a-jwt"), &HeaderMap::new());
        assert!(matches!(identity, ConnectionIdentity::Anonymous));
    }

    #[test]
    fn query_token_resolves_to_an_authenticated_identity() {
        let tokens = token_service();
        let token = tokens.issue(&user(7, "site-admin", true)).unwrap();

        let identity = resolve_identity(&tokens, Some(&token), &HeaderMap::new());
        let ConnectionIdentity::Authenticated(claims) = identity else {
            panic!("expected an authenticated identity");
        };
        assert_eq!(claims.sub, 7);
        assert!(claims.is_admin);
    }

    #[test]
    fn bearer_header_is_a_fallback_credential() {
        let tokens = token_service();
        let token = tokens.issue(&user(3, "ada", false)).unwrap();

        let mut headers = HeaderMap::new();
        headers.insert(
            axum::http::header::AUTHORIZATION,
            format!("Bearer {token}").parse().unwrap(),
        );

        let identity = resolve_identity(&tokens, None, &headers);
        assert!(matches!(identity, ConnectionIdentity::Authenticated(_)));
    }

    #[test]
    fn malformed_authorization_header_is_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert(
            axum::http::header::AUTHORIZATION,
            "Token abc".parse().unwrap(),
        );
        assert!(bearer_token(&headers).is_none());
    }
}
