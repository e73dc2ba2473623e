//! services/api/src/web/protocol.rs
//!
//! Defines the WebSocket message protocol between the browser's verse panel
//! and the API server.

use selah_core::{domain::Mood, domain::VersePayload, orchestrator::PanelView};
use serde::{Deserialize, Serialize};

//=========================================================================================
// Messages Sent FROM the Client (Browser) TO the Server
//=========================================================================================

/// Represents the structured text messages a client can send to the server.
#[derive(Deserialize, Debug, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// The user picked a mood; starts a generation for it.
    SelectMood { mood: Mood },

    /// Supplies (or clears) a verse to show instead of asking the AI.
    SetVerse {
        #[serde(default)]
        verse: Option<VersePayload>,
    },

    /// "Generate another verse": a fresh attempt that avoids what was already shown.
    GenerateAnother,

    /// Copies the current verse to the user's clipboard.
    CopyVerse,

    /// "Back to moods": discards any in-flight generation.
    Back,
}

//=========================================================================================
// Messages Sent FROM the Server TO the Client (Browser)
//=========================================================================================

/// Represents the structured text messages the server can send to the client.
#[derive(Serialize, Debug, Clone)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// The panel's current state. Sent on connect and after every change.
    Panel(PanelView),

    /// Text the browser should write to the system clipboard.
    Clipboard { text: String },

    /// Reports a problem with a client message.
    Error { message: String },
}
