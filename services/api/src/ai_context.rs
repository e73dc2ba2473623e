//! services/api/src/ai_context.rs
//!
//! The process-wide holder of the AI chat capability. It goes through an
//! explicit lifecycle so handlers can tell "not ready yet" from "failed",
//! and tests can inject a substitute capability.

use selah_core::ports::{AiChatService, PortResult};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info, warn};
use utoipa::ToSchema;

pub enum AiStatus {
    Uninitialized,
    Initializing,
    Ready(Arc<dyn AiChatService>),
    Error(String),
}

/// A serializable summary of `AiStatus`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AiStatusKind {
    Uninitialized,
    Initializing,
    Ready,
    Error,
}

pub struct AiContext {
    status: RwLock<AiStatus>,
}

impl Default for AiContext {
    fn default() -> Self {
        Self::new()
    }
}

impl AiContext {
    pub fn new() -> Self {
        Self {
            status: RwLock::new(AiStatus::Uninitialized),
        }
    }

    /// A context that is ready from the start.
    pub fn ready(ai: Arc<dyn AiChatService>) -> Self {
        Self {
            status: RwLock::new(AiStatus::Ready(ai)),
        }
    }

    /// Runs `init` unless the capability is already ready or initializing.
    /// A failed initialization leaves the context in `Error`; it can be retried.
    pub async fn initialize<F, Fut>(&self, init: F)
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = PortResult<Arc<dyn AiChatService>>>,
    {
        {
            let mut status = self.status.write().await;
            if matches!(*status, AiStatus::Ready(_) | AiStatus::Initializing) {
                warn!("AI context already initialized, ignoring");
                return;
            }
            *status = AiStatus::Initializing;
        }

        let outcome = init().await;
        let mut status = self.status.write().await;
        *status = match outcome {
            Ok(ai) => {
                info!("AI capability ready");
                AiStatus::Ready(ai)
            }
            Err(e) => {
                error!("AI capability unavailable, verses will come from the fallback table: {}", e);
                AiStatus::Error(e.to_string())
            }
        };
    }

    /// The capability, only while ready.
    pub async fn handle(&self) -> Option<Arc<dyn AiChatService>> {
        match &*self.status.read().await {
            AiStatus::Ready(ai) => Some(ai.clone()),
            _ => None,
        }
    }

    pub async fn kind(&self) -> AiStatusKind {
        match &*self.status.read().await {
            AiStatus::Uninitialized => AiStatusKind::Uninitialized,
            AiStatus::Initializing => AiStatusKind::Initializing,
            AiStatus::Ready(_) => AiStatusKind::Ready,
            AiStatus::Error(_) => AiStatusKind::Error,
        }
    }

    pub async fn error_message(&self) -> Option<String> {
        match &*self.status.read().await {
            AiStatus::Error(message) => Some(message.clone()),
            _ => None,
        }
    }
}
