//! services/api/src/web/ws_handler.rs
//!
//! This is the main entry point and control loop for a verse panel WebSocket
//! connection. One connection is one page session: it owns one orchestrator,
//! so the references to avoid accumulate until the socket closes.

use crate::{
    adapters::WsClipboard,
    web::{
        middleware::SessionId,
        protocol::{ClientMessage, ServerMessage},
        state::AppState,
    },
};
use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
    Extension,
};
use futures::{stream::{SplitSink, StreamExt}, SinkExt};
use selah_core::{
    fallback::DEFAULT_MOOD,
    orchestrator::{PanelView, Trigger, VerseOrchestrator},
};
use std::sync::Arc;
use tokio::{
    sync::{watch, Mutex},
    task::JoinHandle,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

type WsSender = Arc<Mutex<SplitSink<WebSocket, Message>>>;

/// The handler for upgrading HTTP requests to WebSocket connections.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(app_state): State<Arc<AppState>>,
    Extension(session_id): Extension<SessionId>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, app_state, session_id))
}

async fn handle_socket(socket: WebSocket, app_state: Arc<AppState>, session_id: SessionId) {
    info!("Verse panel connected for session {}", session_id.0);

    // Shared by the view forwarder, the clipboard and error replies.
    let (sender, mut receiver) = socket.split();
    let ws_sender: WsSender = Arc::new(Mutex::new(sender));

    let panel = VerseOrchestrator::new(DEFAULT_MOOD, app_state.ai.handle().await);
    if !panel.has_ai() {
        warn!("AI capability not ready; this panel will only show fallback verses");
    }
    let clipboard = WsClipboard::new(ws_sender.clone());

    // --- 1. Panel state forwarding ---
    let shutdown = CancellationToken::new();
    let forwarder = tokio::spawn(forward_views(
        panel.subscribe(),
        ws_sender.clone(),
        shutdown.clone(),
    ));

    // --- 2. Main Message Loop ---
    let mut generation_tasks: Vec<JoinHandle<()>> = Vec::new();
    loop {
        if let Some(Ok(msg)) = receiver.next().await {
            match msg {
                Message::Text(text) => {
                    handle_text_message(
                        text.as_str(),
                        &panel,
                        &clipboard,
                        &ws_sender,
                        &mut generation_tasks,
                    )
                    .await;
                }
                Message::Close(_) => {
                    info!("Client sent close message.");
                    break;
                }
                _ => {}
            }
        } else {
            info!("Client disconnected.");
            break;
        }
    }

    // --- 3. Cleanup ---
    shutdown.cancel();
    for task in generation_tasks {
        task.abort();
    }
    if let Err(e) = forwarder.await {
        error!("Panel forwarder task failed: {:?}", e);
    }
    info!("Verse panel connection closed.");
}

/// Sends the current panel view, then every later one, until shut down.
async fn forward_views(
    mut views: watch::Receiver<PanelView>,
    ws_sender: WsSender,
    shutdown: CancellationToken,
) {
    let initial = views.borrow_and_update().clone();
    if send_message(&ws_sender, &ServerMessage::Panel(initial)).await.is_err() {
        return;
    }

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            changed = views.changed() => {
                if changed.is_err() {
                    break;
                }
                let view = views.borrow_and_update().clone();
                if send_message(&ws_sender, &ServerMessage::Panel(view)).await.is_err() {
                    break;
                }
            }
        }
    }
}

/// Helper function to handle the logic for different `ClientMessage` variants.
async fn handle_text_message(
    text: &str,
    panel: &VerseOrchestrator,
    clipboard: &WsClipboard,
    ws_sender: &WsSender,
    generation_tasks: &mut Vec<JoinHandle<()>>,
) {
    let client_msg = match serde_json::from_str::<ClientMessage>(text) {
        Ok(client_msg) => client_msg,
        Err(e) => {
            warn!("Failed to deserialize client message: {}", e);
            let err_msg = ServerMessage::Error {
                message: format!("Unrecognized message: {}", e),
            };
            let _ = send_message(ws_sender, &err_msg).await;
            return;
        }
    };

    match client_msg {
        ClientMessage::SelectMood { mood } => {
            info!(%mood, "Mood selected.");
            start_generation(panel, Trigger::MoodChanged(mood), generation_tasks).await;
        }
        ClientMessage::SetVerse { verse } => {
            debug!(has_verse = verse.is_some(), "Verse payload changed.");
            start_generation(panel, Trigger::PayloadChanged(verse), generation_tasks).await;
        }
        ClientMessage::GenerateAnother => {
            info!("Generate another requested.");
            start_generation(panel, Trigger::Regenerate, generation_tasks).await;
        }
        ClientMessage::CopyVerse => {
            if !panel.copy_verse(clipboard).await {
                warn!("Copy to clipboard did not go through.");
            }
        }
        ClientMessage::Back => {
            info!("Back to moods; discarding any in-flight generation.");
            panel.dismiss().await;
        }
    }
}

/// Starts the attempt before spawning so attempts are ordered like the
/// messages that caused them.
async fn start_generation(
    panel: &VerseOrchestrator,
    trigger: Trigger,
    generation_tasks: &mut Vec<JoinHandle<()>>,
) {
    generation_tasks.retain(|task| !task.is_finished());

    let attempt = panel.begin(trigger).await;
    let panel = panel.clone();
    generation_tasks.push(tokio::spawn(async move {
        let generation = attempt.generation();
        if panel.run(attempt).await.is_none() {
            debug!(generation, "Generation superseded.");
        }
    }));
}

async fn send_message(ws_sender: &WsSender, msg: &ServerMessage) -> Result<(), ()> {
    let json = serde_json::to_string(msg).map_err(|e| {
        error!("Failed to serialize server message: {}", e);
    })?;
    ws_sender
        .lock()
        .await
        .send(Message::Text(json.into()))
        .await
        .map_err(|e| {
            warn!("WebSocket client disconnected or send error: {}", e);
        })
}
