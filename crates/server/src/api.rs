//! HTTP API handlers and routes using axum.
//!
//! Routes:
//! - POST /auth/login - Create-or-authenticate, returns a bearer token
//! - GET /auth/profile - The caller's token-derived user view
//! - GET /auth/validate - Re-check a token against the user store
//! - POST /feedback - Submit feedback (authenticated)
//! - GET /feedback - List feedback (admins: all, others: own)
//! - GET /feedback/my-feedback - The caller's own submissions
//! - GET /feedback/{id} - Single entry (owner or admin)
//! - PATCH /feedback/{id}/mark-inappropriate - Flag an entry (admin)
//! - DELETE /feedback/{id} - Remove an entry (owner or admin)
//! - GET /health - Health check with registry/store counts

use crate::error::ApiError;
use auth::{AuthService, Claims, PublicUser, TokenService, UserStore};
use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, patch, post},
    Json, Router,
};
use feedback::{Feedback, FeedbackService, NewFeedback};
use gateway::ClientRegistry;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthService>,
    pub feedback: Arc<FeedbackService>,
    pub registry: Arc<ClientRegistry>,
    pub tokens: Arc<TokenService>,
    pub users: Arc<UserStore>,
}

/// Create the REST router.
pub fn api_routes(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/auth/login", post(login_handler))
        .route("/auth/profile", get(profile_handler))
        .route("/auth/validate", get(validate_handler))
        .route(
            "/feedback",
            post(create_feedback_handler).get(list_feedback_handler),
        )
        // The static segment wins over the {id} capture regardless of
        // declaration order.
        .route("/feedback/my-feedback", get(my_feedback_handler))
        .route(
            "/feedback/{id}",
            get(get_feedback_handler).delete(delete_feedback_handler),
        )
        .route(
            "/feedback/{id}/mark-inappropriate",
            patch(mark_inappropriate_handler),
        )
        .with_state(state)
}

// ============================================================================
// Bearer Authentication
// ============================================================================

/// Extract a bearer token from the Authorization header.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(axum::http::header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

/// Verify the caller's bearer token. Fail-closed: every protected route
/// goes through here and a missing or bad token is a 401.
fn require_claims(state: &AppState, headers: &HeaderMap) -> Result<Claims, ApiError> {
    let token = bearer_token(headers)
        .ok_or_else(|| ApiError::Unauthorized("Missing bearer token".to_string()))?;
    state
        .tokens
        .verify(token)
        .map_err(|_| ApiError::Unauthorized("Invalid token".to_string()))
}

// ============================================================================
// Auth Handlers
// ============================================================================

#[derive(Debug, Deserialize)]
struct LoginRequest {
    username: String,
    password: String,
}

#[derive(Serialize)]
struct LoginResponse {
    message: String,
    token: String,
    user: PublicUser,
    #[serde(rename = "isNewUser")]
    is_new_user: bool,
}

/// POST /auth/login
async fn login_handler(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if body.username.trim().is_empty() || body.password.is_empty() {
        return Err(ApiError::BadRequest(
            "username and password are required".to_string(),
        ));
    }

    let outcome = state.auth.login(&body.username, &body.password)?;
    let message = if outcome.is_new_user {
        "Account created and logged in successfully"
    } else {
        "Login successful"
    };
    Ok(Json(LoginResponse {
        message: message.to_string(),
        token: outcome.token,
        user: outcome.user,
        is_new_user: outcome.is_new_user,
    }))
}

/// GET /auth/profile
async fn profile_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let claims = require_claims(&state, &headers)?;
    Ok(Json(PublicUser {
        id: claims.sub,
        username: claims.username,
        is_admin: claims.is_admin,
    }))
}

#[derive(Serialize)]
struct ValidateResponse {
    valid: bool,
    user: PublicUser,
}

/// GET /auth/validate
async fn validate_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let claims = require_claims(&state, &headers)?;
    let user = state.auth.validate(&claims)?;
    Ok(Json(ValidateResponse { valid: true, user }))
}

// ============================================================================
// Feedback Handlers
// ============================================================================

#[derive(Serialize)]
struct FeedbackResponse {
    message: String,
    feedback: Feedback,
}

#[derive(Serialize)]
struct FeedbackListResponse {
    message: String,
    feedback: Vec<Feedback>,
}

#[derive(Serialize)]
struct MessageResponse {
    message: String,
}

/// POST /feedback
async fn create_feedback_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<NewFeedback>,
) -> Result<impl IntoResponse, ApiError> {
    let claims = require_claims(&state, &headers)?;
    let created = state.feedback.submit(body, claims.sub)?;
    Ok((
        StatusCode::CREATED,
        Json(FeedbackResponse {
            message: "Feedback submitted successfully".to_string(),
            feedback: created,
        }),
    ))
}

/// GET /feedback
async fn list_feedback_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let claims = require_claims(&state, &headers)?;
    let entries = if claims.is_admin {
        state.feedback.store().list_all()
    } else {
        state.feedback.store().list_by_user(claims.sub)
    };
    Ok(Json(FeedbackListResponse {
        message: "Feedback retrieved successfully".to_string(),
        feedback: entries,
    }))
}

/// GET /feedback/my-feedback
async fn my_feedback_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let claims = require_claims(&state, &headers)?;
    Ok(Json(FeedbackListResponse {
        message: "Your feedback retrieved successfully".to_string(),
        feedback: state.feedback.store().list_by_user(claims.sub),
    }))
}

/// GET /feedback/{id}
async fn get_feedback_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let claims = require_claims(&state, &headers)?;
    let entry = state
        .feedback
        .store()
        .get(id)
        .ok_or_else(|| ApiError::NotFound("Feedback not found".to_string()))?;

    if !claims.is_admin && entry.user_id != claims.sub {
        return Err(ApiError::Forbidden("Access denied".to_string()));
    }

    Ok(Json(FeedbackResponse {
        message: "Feedback retrieved successfully".to_string(),
        feedback: entry,
    }))
}

/// PATCH /feedback/{id}/mark-inappropriate
async fn mark_inappropriate_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let claims = require_claims(&state, &headers)?;
    if !claims.is_admin {
        return Err(ApiError::Forbidden("Access denied".to_string()));
    }

    let flagged = state.feedback.store().mark_inappropriate(id)?;
    Ok(Json(FeedbackResponse {
        message: "Feedback marked as inappropriate".to_string(),
        feedback: flagged,
    }))
}

/// DELETE /feedback/{id}
async fn delete_feedback_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let claims = require_claims(&state, &headers)?;
    let entry = state
        .feedback
        .store()
        .get(id)
        .ok_or_else(|| ApiError::NotFound("Feedback not found".to_string()))?;

    if !claims.is_admin && entry.user_id != claims.sub {
        return Err(ApiError::Forbidden("Access denied".to_string()));
    }

    state.feedback.store().delete(id)?;
    Ok(Json(MessageResponse {
        message: "Feedback deleted successfully".to_string(),
    }))
}

// ============================================================================
// Health
// ============================================================================

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    clients: usize,
    admins: usize,
    feedback: usize,
    users: usize,
}

/// GET /health
async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        clients: state.registry.client_count(),
        admins: state.registry.admin_count(),
        feedback: state.feedback.store().feedback_count(),
        users: state.users.user_count(),
    })
}
