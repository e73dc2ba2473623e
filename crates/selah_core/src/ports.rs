//! crates/selah_core/src/ports.rs
//!
//! The capabilities the orchestrator and the web layer depend on: the hosted AI,
//! auth sessions, and the user's clipboard. Adapters in the service implement them.

use async_trait::async_trait;
use crate::domain::AuthSession;
use crate::response::ChatResponse;

/// Failure of any port call. Vendor and transport errors are flattened into
/// `Unexpected` by the adapters.
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Port call failed: {0}")]
    Unexpected(String),
}

pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Ports
//=========================================================================================

#[async_trait]
pub trait AiChatService: Send + Sync {
    /// Sends one instruction to the hosted AI. `Ok(None)` means the call went
    /// through but produced no response.
    async fn chat(&self, prompt: &str) -> PortResult<Option<ChatResponse>>;
}

#[async_trait]
pub trait AuthService: Send + Sync {
    async fn is_authenticated(&self, session_id: &str) -> PortResult<bool>;

    /// Starts a new signed-in session.
    async fn sign_in(&self) -> PortResult<AuthSession>;

    async fn sign_out(&self, session_id: &str) -> PortResult<()>;
}

#[async_trait]
pub trait ClipboardService: Send + Sync {
    /// Writes text to the user's clipboard.
    async fn write_text(&self, text: &str) -> PortResult<()>;
}
