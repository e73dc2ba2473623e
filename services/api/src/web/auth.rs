//! services/api/src/web/auth.rs
//!
//! Authentication endpoints: sign in, sign out, and the auth page state.

use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Duration, Utc};
use selah_core::ports::PortError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use crate::web::state::AppState;

/// Name of the cookie carrying the auth session id.
pub const SESSION_COOKIE: &str = "session";

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, IntoParams)]
pub struct AuthPageQuery {
    /// Where to go once signed in.
    pub next: Option<String>,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct AuthPageResponse {
    pub is_authenticated: bool,
    pub next: String,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct AuthResponse {
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

//=========================================================================================
// Cookie helpers
//=========================================================================================

/// Reads the auth session id out of the request's `Cookie` header.
pub fn session_id_from_headers(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())?
        .split(';')
        .find_map(|c| {
            let c = c.trim();
            c.strip_prefix(SESSION_COOKIE)?.strip_prefix('=')
        })
        .filter(|id| !id.is_empty())
}

fn session_cookie(session_id: &str, max_age: Duration) -> String {
    format!(
        "{}={}; HttpOnly; Secure; SameSite=Lax; Path=/; Max-Age={}",
        SESSION_COOKIE,
        session_id,
        max_age.num_seconds()
    )
}

/// Only same-site relative paths are followed after sign-in.
fn safe_next(next: Option<String>) -> String {
    next.filter(|n| n.starts_with('/') && !n.starts_with("//"))
        .unwrap_or_else(|| "/".to_string())
}

//=========================================================================================
// Handlers
//=========================================================================================

/// GET /auth - State of the sign-in page
#[utoipa::path(
    get,
    path = "/auth",
    params(AuthPageQuery),
    responses(
        (status = 200, description = "Whether the caller is signed in, and where to go next", body = AuthPageResponse)
    )
)]
pub async fn auth_page_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AuthPageQuery>,
    headers: HeaderMap,
) -> Json<AuthPageResponse> {
    let is_authenticated = match session_id_from_headers(&headers) {
        Some(session_id) => state
            .auth
            .is_authenticated(session_id)
            .await
            .unwrap_or_else(|e| {
                error!("Failed to check auth session: {:?}", e);
                false
            }),
        None => false,
    };
    Json(AuthPageResponse {
        is_authenticated,
        next: safe_next(query.next),
    })
}

/// POST /auth/sign-in - Start a signed-in session
#[utoipa::path(
    post,
    path = "/auth/sign-in",
    responses(
        (status = 200, description = "Signed in", body = AuthResponse),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn sign_in_handler(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let session = state.auth.sign_in().await.map_err(|e| {
        error!("Failed to sign in: {:?}", e);
        (StatusCode::INTERNAL_SERVER_ERROR, "Failed to sign in".to_string())
    })?;

    let cookie = session_cookie(&session.id, session.expires_at - Utc::now());
    let response = AuthResponse {
        user_id: session.user_id,
        expires_at: session.expires_at,
    };

    Ok((StatusCode::OK, [(header::SET_COOKIE, cookie)], Json(response)))
}

/// POST /auth/sign-out - End the current session
#[utoipa::path(
    post,
    path = "/auth/sign-out",
    responses(
        (status = 200, description = "Signed out"),
        (status = 401, description = "No active session")
    )
)]
pub async fn sign_out_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let session_id = session_id_from_headers(&headers)
        .ok_or((StatusCode::UNAUTHORIZED, "No session found".to_string()))?;

    state.auth.sign_out(session_id).await.map_err(|e| match e {
        PortError::NotFound(_) => (StatusCode::UNAUTHORIZED, "No session found".to_string()),
        other => {
            error!("Failed to sign out: {:?}", other);
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to sign out".to_string())
        }
    })?;

    let cookie = session_cookie("", Duration::zero());
    Ok((StatusCode::OK, [(header::SET_COOKIE, cookie)]))
}
