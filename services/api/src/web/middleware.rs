//! services/api/src/web/middleware.rs
//!
//! Authentication middleware for gating the verse routes.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{Redirect, Response},
};
use std::sync::Arc;
use tracing::{debug, error};

use crate::web::{auth::session_id_from_headers, state::AppState};

/// Where unauthenticated users are sent instead of getting a verse.
pub const SIGN_IN_REDIRECT: &str = "/auth?next=/";

/// The authenticated session id, available to handlers behind `require_auth`.
#[derive(Clone, Debug)]
pub struct SessionId(pub String);

/// Middleware that validates the auth session cookie.
///
/// If valid, inserts the `SessionId` into request extensions for handlers to use.
/// Otherwise redirects to the sign-in page.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, Redirect> {
    // 1. Extract the session id from the cookie header
    let session_id = session_id_from_headers(req.headers())
        .map(str::to_string)
        .ok_or_else(|| {
            debug!("No session cookie, redirecting to sign-in");
            Redirect::to(SIGN_IN_REDIRECT)
        })?;

    // 2. Validate the auth session
    let authenticated = state
        .auth
        .is_authenticated(&session_id)
        .await
        .unwrap_or_else(|e| {
            error!("Failed to validate auth session: {:?}", e);
            false
        });
    if !authenticated {
        debug!("Auth session not valid, redirecting to sign-in");
        return Err(Redirect::to(SIGN_IN_REDIRECT));
    }

    // 3. Insert the session id into request extensions
    req.extensions_mut().insert(SessionId(session_id));

    // 4. Continue to the handler
    Ok(next.run(req).await)
}
