pub mod domain;
pub mod fallback;
pub mod orchestrator;
pub mod ports;
pub mod prompt;
pub mod response;

pub use domain::{
    AuthSession, DevotionalBundle, Mood, Prayer, Story, UsedReferenceSet, VerseEntry,
    VerseFields, VersePayload,
};
pub use fallback::{fallback_verse, DEFAULT_MOOD};
pub use orchestrator::{
    Attempt, FallbackReason, PanelPhase, PanelView, Trigger, VerseOrchestrator, VerseSource,
    COPY_ACK_DELAY,
};
pub use ports::{AiChatService, AuthService, ClipboardService, PortError, PortResult};
pub use response::{ChatContent, ChatResponse, ContentPart};
