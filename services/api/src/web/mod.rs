pub mod auth;
pub mod middleware;
pub mod protocol;
pub mod rest;
pub mod state;
pub mod ws_handler;

// Re-export the handlers the binary and tests need to build the router.
pub use middleware::require_auth;
pub use rest::{generate_verse_handler, landing_handler, list_moods_handler};
pub use ws_handler::ws_handler;

use axum::{
    http::{
        header::{ACCEPT, CONTENT_TYPE},
        Method,
    },
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use state::AppState;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Builds the API router: public routes, the routes gated behind a signed-in
/// session, CORS for the configured origin, and request tracing.
pub fn api_router(app_state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(app_state.config.cors_origin.clone())
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, ACCEPT]);

    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/", get(landing_handler))
        .route("/moods", get(list_moods_handler))
        .route("/auth", get(auth::auth_page_handler))
        .route("/auth/sign-in", post(auth::sign_in_handler))
        .route("/auth/sign-out", post(auth::sign_out_handler));

    // Gated routes (signed-in session required)
    let protected_routes = Router::new()
        .route("/verses", post(generate_verse_handler))
        .route("/ws", get(ws_handler))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            require_auth,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
