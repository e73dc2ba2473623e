//! crates/selah_core/src/orchestrator.rs
//!
//! The verse panel's state machine. Every trigger starts one generation
//! attempt; an attempt's result is only applied while it is still the most
//! recently started one.

use crate::{
    domain::{DevotionalBundle, Mood, Prayer, Story, UsedReferenceSet, VerseEntry, VersePayload},
    fallback::fallback_verse,
    ports::{AiChatService, ClipboardService},
    prompt::{prepare_instructions, PromptRequest},
    response::{parse_devotional, parse_payload_verse},
};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tracing::{debug, error, info, warn};

/// How long the "copied" acknowledgment stays up.
pub const COPY_ACK_DELAY: Duration = Duration::from_secs(2);

//=========================================================================================
// Public state types
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PanelPhase {
    /// Nothing requested yet, or the consumer moved away.
    Idle,
    Loading,
    /// Showing a verse from the payload or the AI.
    Ready,
    /// Showing the static verse for the mood.
    Fallback,
}

/// What the verse panel currently shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PanelView {
    pub phase: PanelPhase,
    pub loading: bool,
    pub mood: Mood,
    pub bundle: DevotionalBundle,
    pub copied: bool,
}

/// The events that start a generation attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Trigger {
    MoodChanged(Mood),
    PayloadChanged(Option<VersePayload>),
    Regenerate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackReason {
    AiUnavailable,
    AiCallFailed,
    EmptyResponse,
    MalformedResponse,
    NoVerses,
}

/// Where the verse of a finished attempt came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "source", content = "reason", rename_all = "snake_case")]
pub enum VerseSource {
    Payload,
    Ai,
    Fallback(FallbackReason),
}

/// One started generation. Carries a snapshot of the inputs so it can be
/// resolved without holding the panel state.
#[derive(Debug, Clone)]
pub struct Attempt {
    generation: u64,
    mood: Mood,
    payload: Option<VersePayload>,
    avoid_references: Vec<String>,
}

impl Attempt {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

//=========================================================================================
// Internal state
//=========================================================================================

struct PanelState {
    view: PanelView,
    payload: Option<VersePayload>,
    used_references: UsedReferenceSet,
    generation: u64,
    copy_seq: u64,
}

struct Shared {
    ai: Option<Arc<dyn AiChatService>>,
    state: Mutex<PanelState>,
    views: watch::Sender<PanelView>,
}

impl Shared {
    fn publish(&self, state: &PanelState) {
        self.views.send_replace(state.view.clone());
    }
}

/// What resolving an attempt produced, before it is applied.
struct Resolution {
    source: VerseSource,
    /// `None` means use the fallback verse for the attempt's mood.
    verse: Option<VerseEntry>,
    summary: Option<String>,
    story: Option<Story>,
    prayer: Option<Prayer>,
    encouragement: Option<String>,
    new_references: Vec<String>,
}

impl Resolution {
    fn adopted(source: VerseSource, verse: VerseEntry) -> Self {
        Self {
            source,
            verse: Some(verse),
            summary: None,
            story: None,
            prayer: None,
            encouragement: None,
            new_references: Vec::new(),
        }
    }

    fn fallback(reason: FallbackReason) -> Self {
        Self {
            source: VerseSource::Fallback(reason),
            verse: None,
            summary: None,
            story: None,
            prayer: None,
            encouragement: None,
            new_references: Vec::new(),
        }
    }
}

//=========================================================================================
// The orchestrator
//=========================================================================================

/// Drives the verse panel for one session. Cloning yields another handle to
/// the same panel.
#[derive(Clone)]
pub struct VerseOrchestrator {
    shared: Arc<Shared>,
}

impl VerseOrchestrator {
    /// Creates an idle panel showing the fallback verse for `mood`.
    /// Without an AI capability every attempt ends on the fallback table.
    pub fn new(mood: Mood, ai: Option<Arc<dyn AiChatService>>) -> Self {
        let view = PanelView {
            phase: PanelPhase::Idle,
            loading: false,
            bundle: DevotionalBundle::from_verse(fallback_verse(&mood)),
            mood,
            copied: false,
        };
        let (views, _) = watch::channel(view.clone());
        let state = PanelState {
            view,
            payload: None,
            used_references: UsedReferenceSet::new(),
            generation: 0,
            copy_seq: 0,
        };
        Self {
            shared: Arc::new(Shared {
                ai,
                state: Mutex::new(state),
                views,
            }),
        }
    }

    /// Seeds the references to avoid, e.g. when a caller carries them between requests.
    pub async fn with_used_references<I, S>(self, references: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.shared.state.lock().await.used_references.extend(references);
        self
    }

    pub fn has_ai(&self) -> bool {
        self.shared.ai.is_some()
    }

    /// Receives a new `PanelView` on every state change.
    pub fn subscribe(&self) -> watch::Receiver<PanelView> {
        self.shared.views.subscribe()
    }

    pub async fn view(&self) -> PanelView {
        self.shared.state.lock().await.view.clone()
    }

    pub async fn used_references(&self) -> Vec<String> {
        self.shared.state.lock().await.used_references.as_slice().to_vec()
    }

    /// Starts an attempt and runs it to completion. Returns `None` when a newer
    /// attempt started in the meantime and this one was discarded.
    pub async fn generate(&self, trigger: Trigger) -> Option<VerseSource> {
        let attempt = self.begin(trigger).await;
        self.run(attempt).await
    }

    /// Records the trigger's input and enters the loading state. The displayed
    /// verse is kept; summary, story, prayer and encouragement are cleared.
    pub async fn begin(&self, trigger: Trigger) -> Attempt {
        let mut state = self.shared.state.lock().await;
        match trigger {
            Trigger::MoodChanged(mood) => state.view.mood = mood,
            Trigger::PayloadChanged(payload) => state.payload = payload,
            Trigger::Regenerate => {}
        }
        state.generation += 1;
        state.view.phase = PanelPhase::Loading;
        state.view.loading = true;
        state.view.bundle.clear_extras();
        self.shared.publish(&state);

        debug!(generation = state.generation, mood = %state.view.mood, "Generation attempt started");
        Attempt {
            generation: state.generation,
            mood: state.view.mood.clone(),
            payload: state.payload.clone(),
            avoid_references: state.used_references.as_slice().to_vec(),
        }
    }

    /// Resolves a started attempt and applies it if it is still current.
    pub async fn run(&self, attempt: Attempt) -> Option<VerseSource> {
        let resolution = self.resolve(&attempt).await;
        self.commit(&attempt, resolution).await
    }

    /// Abandons any in-flight attempt and returns the panel to idle.
    pub async fn dismiss(&self) {
        let mut state = self.shared.state.lock().await;
        state.generation += 1;
        state.view.phase = PanelPhase::Idle;
        state.view.loading = false;
        self.shared.publish(&state);
    }

    /// Writes the current verse to the clipboard and raises the `copied` flag
    /// for `COPY_ACK_DELAY`. Returns whether the write succeeded.
    pub async fn copy_verse(&self, clipboard: &dyn ClipboardService) -> bool {
        let text = self.shared.state.lock().await.view.bundle.verse.clipboard_text();
        if let Err(e) = clipboard.write_text(&text).await {
            error!("Failed to copy verse: {:?}", e);
            return false;
        }

        let seq = {
            let mut state = self.shared.state.lock().await;
            state.copy_seq += 1;
            state.view.copied = true;
            self.shared.publish(&state);
            state.copy_seq
        };

        let shared = self.shared.clone();
        tokio::spawn(async move {
            tokio::time::sleep(COPY_ACK_DELAY).await;
            let mut state = shared.state.lock().await;
            // A later copy owns the flag now.
            if state.copy_seq == seq {
                state.view.copied = false;
                shared.publish(&state);
            }
        });
        true
    }

    async fn resolve(&self, attempt: &Attempt) -> Resolution {
        if let Some(resolution) = resolve_payload(attempt.payload.as_ref()) {
            return resolution;
        }

        let Some(ai) = self.shared.ai.as_ref() else {
            debug!("No AI capability available, using fallback verse");
            return Resolution::fallback(FallbackReason::AiUnavailable);
        };

        let request = PromptRequest::new(&attempt.mood, &attempt.avoid_references);
        let prompt = prepare_instructions(&request);
        debug!(nonce = %request.nonce, avoided = attempt.avoid_references.len(), "Requesting devotional from AI");

        let response = match ai.chat(&prompt).await {
            Ok(Some(response)) => response,
            Ok(None) => {
                warn!("AI returned no response, using fallback verse");
                return Resolution::fallback(FallbackReason::EmptyResponse);
            }
            Err(e) => {
                error!("AI chat call failed: {:?}", e);
                return Resolution::fallback(FallbackReason::AiCallFailed);
            }
        };

        let Some(text) = response.content.into_text() else {
            warn!("AI response carried no text, using fallback verse");
            return Resolution::fallback(FallbackReason::EmptyResponse);
        };

        let document = match parse_devotional(&text) {
            Ok(document) => document,
            Err(diagnostics) => {
                error!(
                    error = %diagnostics.message,
                    position = diagnostics.offset,
                    near = %diagnostics.excerpt,
                    found = ?diagnostics.found,
                    "Failed to parse AI response JSON"
                );
                debug!(raw = %text, "Raw AI response text");
                return Resolution::fallback(FallbackReason::MalformedResponse);
            }
        };

        let mut resolution = Resolution::fallback(FallbackReason::NoVerses);
        resolution.summary = document.summary.clone().filter(|s| !s.is_empty());
        resolution.story = document.story.clone();
        resolution.prayer = document.prayer.clone();
        resolution.encouragement = document.encouragement.clone().filter(|s| !s.is_empty());

        let Some(verse) = document.first_verse().cloned().map(|v| v.into_entry()) else {
            warn!("AI response has no verses, using fallback verse");
            return resolution;
        };
        if verse.text.trim().is_empty() {
            warn!(reference = %verse.reference, "AI verse has no text, using fallback verse");
            return resolution;
        }

        resolution.new_references.push(verse.reference.clone());
        if let Some(reference) = resolution.story.as_ref().and_then(|s| s.reference.clone()) {
            resolution.new_references.push(reference);
        }
        resolution.source = VerseSource::Ai;
        resolution.verse = Some(verse);
        resolution
    }

    async fn commit(&self, attempt: &Attempt, resolution: Resolution) -> Option<VerseSource> {
        let mut state = self.shared.state.lock().await;
        if state.generation != attempt.generation {
            debug!(
                attempt = attempt.generation,
                current = state.generation,
                "Discarding superseded generation attempt"
            );
            return None;
        }

        let verse = resolution
            .verse
            .unwrap_or_else(|| fallback_verse(&attempt.mood));
        state.view.bundle = DevotionalBundle {
            verse,
            summary: resolution.summary,
            story: resolution.story,
            prayer: resolution.prayer,
            encouragement: resolution.encouragement,
        };
        state.used_references.extend(resolution.new_references);
        state.view.phase = match resolution.source {
            VerseSource::Fallback(_) => PanelPhase::Fallback,
            VerseSource::Payload | VerseSource::Ai => PanelPhase::Ready,
        };
        state.view.loading = false;
        self.shared.publish(&state);

        info!(
            generation = attempt.generation,
            mood = %attempt.mood,
            reference = %state.view.bundle.verse.reference,
            source = ?resolution.source,
            "Generation attempt finished"
        );
        Some(resolution.source)
    }
}

/// Adopts a caller-supplied verse. `None` means generation continues with the AI.
fn resolve_payload(payload: Option<&VersePayload>) -> Option<Resolution> {
    let verse = match payload? {
        VersePayload::Structured(fields) => fields.clone().into_entry(),
        VersePayload::Raw(raw) if raw.trim().is_empty() => return None,
        VersePayload::Raw(raw) => match parse_payload_verse(raw) {
            Some(fields) => fields.into_entry(),
            None => {
                debug!("Supplied verse payload is not usable JSON, continuing with AI");
                return None;
            }
        },
    };
    if verse.text.trim().is_empty() {
        debug!("Supplied verse has no text, continuing with AI");
        return None;
    }
    Some(Resolution::adopted(VerseSource::Payload, verse))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::VerseFields;

    #[test]
    fn structured_payload_is_adopted_with_defaults() {
        let payload = VersePayload::Structured(VerseFields {
            text: Some("T".to_string()),
            reference: None,
            reflection: None,
        });
        let resolution = resolve_payload(Some(&payload)).unwrap();
        assert_eq!(resolution.source, VerseSource::Payload);
        assert_eq!(resolution.verse, Some(VerseEntry::new("T", "", "")));
        assert!(resolution.new_references.is_empty());
    }

    #[test]
    fn unusable_payloads_fall_through() {
        assert!(resolve_payload(None).is_none());
        assert!(resolve_payload(Some(&VersePayload::Raw(String::new()))).is_none());
        assert!(resolve_payload(Some(&VersePayload::Raw("{oops".to_string()))).is_none());
        assert!(resolve_payload(Some(&VersePayload::Raw(r#"{"verses":[]}"#.to_string()))).is_none());
        assert!(resolve_payload(Some(&VersePayload::Structured(VerseFields::default()))).is_none());
    }

    #[test]
    fn raw_payload_uses_first_verse() {
        let raw = VersePayload::Raw(
            r#"{"verses":[{"text":"T1","reference":"R1","reflection":"F1"},{"text":"T2"}]}"#
                .to_string(),
        );
        let resolution = resolve_payload(Some(&raw)).unwrap();
        assert_eq!(resolution.verse, Some(VerseEntry::new("T1", "R1", "F1")));
    }

    #[tokio::test]
    async fn new_panel_is_idle_on_fallback_verse() {
        let panel = VerseOrchestrator::new(Mood::Lonely, None);
        let view = panel.view().await;
        assert_eq!(view.phase, PanelPhase::Idle);
        assert!(!view.loading);
        assert_eq!(view.bundle.verse, fallback_verse(&Mood::Lonely));
        assert!(!panel.has_ai());
    }

    #[tokio::test]
    async fn begin_keeps_verse_and_clears_extras() {
        let panel = VerseOrchestrator::new(Mood::Sad, None);
        {
            let mut state = panel.shared.state.lock().await;
            state.view.bundle.summary = Some("old".to_string());
            state.view.bundle.prayer = Some(Prayer::default());
        }
        let attempt = panel.begin(Trigger::Regenerate).await;
        let view = panel.view().await;

        assert_eq!(attempt.generation(), 1);
        assert!(view.loading);
        assert_eq!(view.phase, PanelPhase::Loading);
        assert_eq!(view.bundle.verse, fallback_verse(&Mood::Sad));
        assert_eq!(view.bundle.summary, None);
        assert_eq!(view.bundle.prayer, None);
    }

    #[tokio::test]
    async fn dismiss_discards_in_flight_attempt() {
        let panel = VerseOrchestrator::new(Mood::Happy, None);
        let attempt = panel.begin(Trigger::MoodChanged(Mood::Angry)).await;
        panel.dismiss().await;

        assert_eq!(panel.run(attempt).await, None);
        let view = panel.view().await;
        assert_eq!(view.phase, PanelPhase::Idle);
        assert!(!view.loading);
        assert_eq!(view.bundle.verse, fallback_verse(&Mood::Happy));
    }
}
