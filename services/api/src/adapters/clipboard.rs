//! services/api/src/adapters/clipboard.rs
//!
//! The server cannot reach the user's clipboard, so the text is handed to the
//! browser over the panel's WebSocket and written there.

use crate::web::protocol::ServerMessage;
use async_trait::async_trait;
use axum::extract::ws::{Message, WebSocket};
use futures::{stream::SplitSink, SinkExt};
use selah_core::ports::{ClipboardService, PortError, PortResult};
use std::sync::Arc;
use tokio::sync::Mutex;

pub struct WsClipboard {
    ws_sender: Arc<Mutex<SplitSink<WebSocket, Message>>>,
}

impl WsClipboard {
    pub fn new(ws_sender: Arc<Mutex<SplitSink<WebSocket, Message>>>) -> Self {
        Self { ws_sender }
    }
}

#[async_trait]
impl ClipboardService for WsClipboard {
    async fn write_text(&self, text: &str) -> PortResult<()> {
        let msg = ServerMessage::Clipboard {
            text: text.to_string(),
        };
        let json = serde_json::to_string(&msg).map_err(|e| PortError::Unexpected(e.to_string()))?;
        self.ws_sender
            .lock()
            .await
            .send(Message::Text(json.into()))
            .await
            .map_err(|e| PortError::Unexpected(format!("Failed to send clipboard text: {}", e)))
    }
}
