//! Feedback board backend: REST API plus the realtime gateway, assembled
//! into a single axum application.

pub mod api;
pub mod config;
pub mod error;

pub use api::{api_routes, AppState};
pub use config::Config;
pub use error::ApiError;

use auth::{AuthService, TokenService, UserStore};
use axum::Router;
use feedback::{FeedbackService, FeedbackStore};
use gateway::{ws_routes, ClientRegistry, GatewayState};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Wire the full application together.
///
/// Returns the shared state alongside the router so tests can reach the
/// stores directly.
pub fn build_app(config: &Config) -> (AppState, Router) {
    let users = Arc::new(UserStore::new());
    let tokens = Arc::new(TokenService::new(
        &config.jwt_secret,
        config.token_ttl_hours,
    ));
    let registry = Arc::new(ClientRegistry::new());

    let auth = Arc::new(AuthService::new(users.clone(), tokens.clone()));
    let feedback = Arc::new(FeedbackService::new(
        Arc::new(FeedbackStore::new()),
        users.clone(),
        registry.clone(),
    ));

    let state = AppState {
        auth,
        feedback,
        registry: registry.clone(),
        tokens: tokens.clone(),
        users,
    };

    let router = api_routes(state.clone())
        .merge(ws_routes(Arc::new(GatewayState { registry, tokens })))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    (state, router)
}
