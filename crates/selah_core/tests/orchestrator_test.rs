use async_trait::async_trait;
use selah_core::{
    fallback_verse, AiChatService, ChatContent, ChatResponse, ClipboardService, ContentPart,
    FallbackReason, Mood, PanelPhase, PortError, PortResult, Trigger, VerseEntry,
    VerseFields, VerseOrchestrator, VersePayload, VerseSource,
};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

//=========================================================================================
// Test doubles
//=========================================================================================

struct Reply {
    result: PortResult<Option<ChatResponse>>,
    gate: Option<Arc<Notify>>,
}

/// Answers calls in order with scripted replies and records every prompt.
#[derive(Default)]
struct ScriptedAi {
    replies: Mutex<VecDeque<Reply>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedAi {
    fn reply(self, result: PortResult<Option<ChatResponse>>) -> Self {
        self.replies.lock().unwrap().push_back(Reply { result, gate: None });
        self
    }

    fn reply_text(self, text: &str) -> Self {
        self.reply(Ok(Some(ChatResponse::text(text))))
    }

    /// A reply that is held back until `gate` is notified.
    fn gated_text(self, text: &str, gate: Arc<Notify>) -> Self {
        self.replies.lock().unwrap().push_back(Reply {
            result: Ok(Some(ChatResponse::text(text))),
            gate: Some(gate),
        });
        self
    }

    fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl AiChatService for ScriptedAi {
    async fn chat(&self, prompt: &str) -> PortResult<Option<ChatResponse>> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .expect("unexpected AI call");
        if let Some(gate) = reply.gate {
            gate.notified().await;
        }
        reply.result
    }
}

#[derive(Default)]
struct RecordingClipboard {
    fail: bool,
    written: Mutex<Vec<String>>,
}

#[async_trait]
impl ClipboardService for RecordingClipboard {
    async fn write_text(&self, text: &str) -> PortResult<()> {
        if self.fail {
            return Err(PortError::Unexpected("permission denied".to_string()));
        }
        self.written.lock().unwrap().push(text.to_string());
        Ok(())
    }
}

fn panel_with(mood: Mood, ai: Arc<ScriptedAi>) -> VerseOrchestrator {
    VerseOrchestrator::new(mood, Some(ai as Arc<dyn AiChatService>))
}

fn verses_json(reference: &str, text: &str) -> String {
    format!(
        r#"{{"verses":[{{"reference":"{reference}","text":"{text}","reflection":"F"}}]}}"#
    )
}

async fn wait_for_calls(ai: &ScriptedAi, count: usize) {
    while ai.prompts().len() < count {
        tokio::task::yield_now().await;
    }
}

//=========================================================================================
// Fallback paths
//=========================================================================================

#[tokio::test]
async fn without_ai_every_mood_ends_on_its_fallback_entry() {
    for mood in Mood::ALL.iter().cloned() {
        let panel = VerseOrchestrator::new(Mood::Happy, None);
        let source = panel.generate(Trigger::MoodChanged(mood.clone())).await;
        let view = panel.view().await;

        assert_eq!(source, Some(VerseSource::Fallback(FallbackReason::AiUnavailable)));
        assert_eq!(view.bundle.verse, fallback_verse(&mood));
        assert!(!view.bundle.verse.text.is_empty());
        assert_eq!(view.phase, PanelPhase::Fallback);
        assert!(!view.loading);
    }
}

#[tokio::test]
async fn unrecognized_mood_without_ai_uses_default_entry() {
    let panel = VerseOrchestrator::new(Mood::Sad, None);
    panel
        .generate(Trigger::MoodChanged(Mood::Other("Restless".to_string())))
        .await;
    assert_eq!(panel.view().await.bundle.verse, fallback_verse(&Mood::Happy));
}

#[tokio::test]
async fn unparseable_response_falls_back_without_recording_references() {
    let ai = Arc::new(ScriptedAi::default().reply_text("not json"));
    let panel = panel_with(Mood::Anxious, ai.clone());

    let source = panel.generate(Trigger::Regenerate).await;
    let view = panel.view().await;

    assert_eq!(source, Some(VerseSource::Fallback(FallbackReason::MalformedResponse)));
    assert_eq!(view.bundle.verse, fallback_verse(&Mood::Anxious));
    assert_eq!(view.bundle.summary, None);
    assert!(panel.used_references().await.is_empty());
}

#[tokio::test]
async fn empty_response_falls_back() {
    let ai = Arc::new(ScriptedAi::default().reply(Ok(None)));
    let panel = panel_with(Mood::Grateful, ai);

    let source = panel.generate(Trigger::Regenerate).await;
    assert_eq!(source, Some(VerseSource::Fallback(FallbackReason::EmptyResponse)));
    assert_eq!(panel.view().await.bundle.verse, fallback_verse(&Mood::Grateful));
}

#[tokio::test]
async fn failed_call_falls_back() {
    let ai = Arc::new(
        ScriptedAi::default().reply(Err(PortError::Unexpected("connection reset".to_string()))),
    );
    let panel = panel_with(Mood::Angry, ai);

    let source = panel.generate(Trigger::Regenerate).await;
    assert_eq!(source, Some(VerseSource::Fallback(FallbackReason::AiCallFailed)));
    assert_eq!(panel.view().await.phase, PanelPhase::Fallback);
}

#[tokio::test]
async fn missing_verses_keep_extras_but_use_fallback_verse() {
    let ai = Arc::new(ScriptedAi::default().reply_text(
        r#"{"summary":"S","verses":[],"story":{"title":"Elijah","reference":"1 Kings 19"},"prayer":{"text":"Amen"}}"#,
    ));
    let panel = panel_with(Mood::Hopeless, ai);

    let source = panel.generate(Trigger::Regenerate).await;
    let view = panel.view().await;

    assert_eq!(source, Some(VerseSource::Fallback(FallbackReason::NoVerses)));
    assert_eq!(view.bundle.verse, fallback_verse(&Mood::Hopeless));
    assert_eq!(view.bundle.summary.as_deref(), Some("S"));
    assert_eq!(view.bundle.story.unwrap().title.as_deref(), Some("Elijah"));
    assert!(panel.used_references().await.is_empty());
}

//=========================================================================================
// AI success paths
//=========================================================================================

#[tokio::test]
async fn ai_verse_and_summary_are_adopted() {
    let ai = Arc::new(ScriptedAi::default().reply_text(
        r#"{"verses":[{"reference":"R1","text":"T1","reflection":"F1"}], "summary":"S"}"#,
    ));
    let panel = panel_with(Mood::Sad, ai);

    let source = panel.generate(Trigger::Regenerate).await;
    let view = panel.view().await;

    assert_eq!(source, Some(VerseSource::Ai));
    assert_eq!(view.bundle.verse, VerseEntry::new("T1", "R1", "F1"));
    assert_eq!(view.bundle.summary.as_deref(), Some("S"));
    assert_eq!(view.phase, PanelPhase::Ready);
    assert_eq!(panel.used_references().await, vec!["R1".to_string()]);
}

#[tokio::test]
async fn ill_typed_side_fields_keep_the_ai_verse() {
    let ai = Arc::new(ScriptedAi::default().reply_text(
        r#"{"mood":5,"verses":[{"reference":"R1","text":"T1","reflection":"F1"}],"summary":"S","prayer":"Dear Lord, amen"}"#,
    ));
    let panel = panel_with(Mood::Sad, ai);

    let source = panel.generate(Trigger::Regenerate).await;
    let view = panel.view().await;

    assert_eq!(source, Some(VerseSource::Ai));
    assert_eq!(view.bundle.verse, VerseEntry::new("T1", "R1", "F1"));
    assert_eq!(view.bundle.summary.as_deref(), Some("S"));
    assert_eq!(view.bundle.prayer, None);
    assert_eq!(panel.used_references().await, vec!["R1".to_string()]);
}

#[tokio::test]
async fn part_list_content_is_normalized_before_parsing() {
    let ai = Arc::new(ScriptedAi::default().reply(Ok(Some(ChatResponse {
        content: ChatContent::Parts(vec![ContentPart {
            text: Some(verses_json("Isaiah 41:10", "Fear not")),
        }]),
    }))));
    let panel = panel_with(Mood::Anxious, ai);

    assert_eq!(panel.generate(Trigger::Regenerate).await, Some(VerseSource::Ai));
    assert_eq!(panel.view().await.bundle.verse.reference, "Isaiah 41:10");
}

#[tokio::test]
async fn story_reference_is_recorded_after_verse_reference() {
    let ai = Arc::new(ScriptedAi::default().reply_text(
        r#"{"verses":[{"reference":"Psalm 42:11","text":"Why, my soul"}],"story":{"title":"Hannah","reference":"1 Samuel 1","text":"..."},"encouragement":"Hold on"}"#,
    ));
    let panel = panel_with(Mood::Sad, ai);
    panel.generate(Trigger::Regenerate).await;

    let view = panel.view().await;
    assert_eq!(view.bundle.verse.reflection, "");
    assert_eq!(view.bundle.encouragement.as_deref(), Some("Hold on"));
    assert_eq!(
        panel.used_references().await,
        vec!["Psalm 42:11".to_string(), "1 Samuel 1".to_string()]
    );
}

#[tokio::test]
async fn regeneration_steers_away_from_previous_references() {
    let ai = Arc::new(
        ScriptedAi::default()
            .reply_text(&verses_json("R1", "T1"))
            .reply_text(&verses_json("R2", "T2")),
    );
    let panel = panel_with(Mood::Lonely, ai.clone());

    panel.generate(Trigger::Regenerate).await;
    panel.generate(Trigger::Regenerate).await;

    assert_eq!(
        panel.used_references().await,
        vec!["R1".to_string(), "R2".to_string()]
    );

    let prompts = ai.prompts();
    assert_eq!(prompts.len(), 2);
    assert!(!prompts[0].contains("DO NOT use these Bible references"));
    let avoid_line = prompts[1]
        .lines()
        .skip_while(|line| !line.contains("DO NOT use these Bible references"))
        .nth(1)
        .unwrap();
    assert_eq!(avoid_line, "R1");
    assert!(!prompts[1].contains("R2"));
}

#[tokio::test]
async fn each_request_carries_a_fresh_request_id() {
    let ai = Arc::new(
        ScriptedAi::default()
            .reply_text("not json")
            .reply_text("not json"),
    );
    let panel = panel_with(Mood::Peaceful, ai.clone());
    panel.generate(Trigger::Regenerate).await;
    panel.generate(Trigger::Regenerate).await;

    let ids: Vec<String> = ai
        .prompts()
        .iter()
        .map(|p| {
            p.lines()
                .find(|line| line.starts_with("Request ID: "))
                .unwrap()
                .to_string()
        })
        .collect();
    assert_ne!(ids[0], ids[1]);
}

//=========================================================================================
// External payload
//=========================================================================================

#[tokio::test]
async fn structured_payload_skips_the_ai() {
    let ai = Arc::new(ScriptedAi::default());
    let panel = panel_with(Mood::Happy, ai.clone());
    let payload = VersePayload::Structured(VerseFields {
        text: Some("Rejoice always".to_string()),
        reference: Some("1 Thessalonians 5:16".to_string()),
        reflection: None,
    });

    let source = panel.generate(Trigger::PayloadChanged(Some(payload))).await;
    let view = panel.view().await;

    assert_eq!(source, Some(VerseSource::Payload));
    assert_eq!(view.bundle.verse.reflection, "");
    assert!(ai.prompts().is_empty());
    assert!(panel.used_references().await.is_empty());
}

#[tokio::test]
async fn malformed_raw_payload_continues_with_the_ai() {
    let ai = Arc::new(ScriptedAi::default().reply_text(&verses_json("R9", "T9")));
    let panel = panel_with(Mood::Happy, ai.clone());

    let source = panel
        .generate(Trigger::PayloadChanged(Some(VersePayload::Raw("{broken".to_string()))))
        .await;

    assert_eq!(source, Some(VerseSource::Ai));
    assert_eq!(ai.prompts().len(), 1);
    assert_eq!(panel.view().await.bundle.verse.reference, "R9");
}

//=========================================================================================
// Supersession
//=========================================================================================

#[tokio::test]
async fn superseded_attempt_does_not_touch_panel_state() {
    let gate_a = Arc::new(Notify::new());
    let gate_b = Arc::new(Notify::new());
    let ai = Arc::new(
        ScriptedAi::default()
            .gated_text(&verses_json("RA", "TA"), gate_a.clone())
            .gated_text(&verses_json("RB", "TB"), gate_b.clone()),
    );
    let panel = panel_with(Mood::Sad, ai.clone());
    let shown_before = panel.view().await.bundle.verse;

    let attempt_a = panel.begin(Trigger::Regenerate).await;
    let task_a = tokio::spawn({
        let panel = panel.clone();
        async move { panel.run(attempt_a).await }
    });
    wait_for_calls(&ai, 1).await;

    let attempt_b = panel.begin(Trigger::Regenerate).await;
    let task_b = tokio::spawn({
        let panel = panel.clone();
        async move { panel.run(attempt_b).await }
    });
    wait_for_calls(&ai, 2).await;

    gate_a.notify_one();
    assert_eq!(task_a.await.unwrap(), None);

    let view = panel.view().await;
    assert!(view.loading);
    assert_eq!(view.phase, PanelPhase::Loading);
    assert_eq!(view.bundle.verse, shown_before);
    assert!(panel.used_references().await.is_empty());

    gate_b.notify_one();
    assert_eq!(task_b.await.unwrap(), Some(VerseSource::Ai));

    let view = panel.view().await;
    assert!(!view.loading);
    assert_eq!(view.bundle.verse, VerseEntry::new("TB", "RB", "F"));
    assert_eq!(panel.used_references().await, vec!["RB".to_string()]);
}

#[tokio::test]
async fn subscribers_see_loading_then_result() {
    let panel = VerseOrchestrator::new(Mood::Happy, None);
    let mut views = panel.subscribe();

    let attempt = panel.begin(Trigger::MoodChanged(Mood::Peaceful)).await;
    views.changed().await.unwrap();
    assert!(views.borrow_and_update().loading);

    panel.run(attempt).await;
    views.changed().await.unwrap();
    let view = views.borrow_and_update().clone();
    assert!(!view.loading);
    assert_eq!(view.mood, Mood::Peaceful);
    assert_eq!(view.bundle.verse.reference, "John 14:27");
}

//=========================================================================================
// Copy to clipboard
//=========================================================================================

#[tokio::test(start_paused = true)]
async fn copy_writes_quoted_verse_and_clears_acknowledgment() {
    let panel = VerseOrchestrator::new(Mood::Peaceful, None);
    panel
        .generate(Trigger::PayloadChanged(Some(VersePayload::Structured(VerseFields {
            text: Some("Peace".to_string()),
            reference: Some("John 14:27".to_string()),
            reflection: None,
        }))))
        .await;
    let clipboard = RecordingClipboard::default();

    assert!(panel.copy_verse(&clipboard).await);
    assert_eq!(
        clipboard.written.lock().unwrap().as_slice(),
        ["\"Peace\"\n— John 14:27".to_string()]
    );
    assert!(panel.view().await.copied);

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert!(panel.view().await.copied);

    tokio::time::sleep(Duration::from_millis(1500)).await;
    assert!(!panel.view().await.copied);
}

#[tokio::test(start_paused = true)]
async fn failed_copy_never_raises_acknowledgment() {
    let panel = VerseOrchestrator::new(Mood::Sad, None);
    let clipboard = RecordingClipboard {
        fail: true,
        ..RecordingClipboard::default()
    };

    assert!(!panel.copy_verse(&clipboard).await);
    assert!(!panel.view().await.copied);
}

#[tokio::test(start_paused = true)]
async fn second_copy_extends_acknowledgment() {
    let panel = VerseOrchestrator::new(Mood::Sad, None);
    let clipboard = RecordingClipboard::default();

    panel.copy_verse(&clipboard).await;
    tokio::time::sleep(Duration::from_millis(1500)).await;
    panel.copy_verse(&clipboard).await;

    tokio::time::sleep(Duration::from_millis(1000)).await;
    assert!(panel.view().await.copied);

    tokio::time::sleep(Duration::from_millis(1500)).await;
    assert!(!panel.view().await.copied);
}
