//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::{ai_context::AiContext, config::Config};
use selah_core::ports::AuthService;
use std::sync::Arc;

//=========================================================================================
// AppState (Shared Across All Connections)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
/// Per-session verse panel state lives with each WebSocket connection instead.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub auth: Arc<dyn AuthService>,
    pub ai: Arc<AiContext>,
}
