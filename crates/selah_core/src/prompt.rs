//! crates/selah_core/src/prompt.rs
//!
//! Builds the instruction sent to the AI chat capability.

use crate::domain::Mood;
use uuid::Uuid;

/// The output contract the AI must follow: one bare JSON object.
pub const AI_RESPONSE_FORMAT: &str = r#"
You are a helpful AI that generates structured JSON responses.

Return ONLY a valid JSON object that follows this exact format (no code blocks, no extra text, no explanations):

{
  "mood": string,
  "summary": string,
  "verses": [
    {
      "reference": string,
      "text": string,
      "reflection": string
    }
  ],
  "story": {
    "title": string,
    "reference": string,
    "text": string
  },
  "prayer": {
    "title": string,
    "text": string
  },
  "encouragement": string
}
"#;

const INSTRUCTIONS_TEMPLATE: &str = r#"You are a compassionate Christian spiritual guide and Bible expert.
The user will provide a mood or emotional state (e.g., anxious, happy, sad, thankful).
Your goal is to comfort and encourage them using relevant Bible verses and short reflections.

- Select 2–3 Bible verses that fit the user's mood.
- Each verse should include its reference and the exact text.
- Provide a brief reflection explaining why that verse helps with this mood.
- Share a Bible story about someone who experienced a similar situation or emotion.
- The story should include a title, biblical reference, and a brief summary of what happened.
- Write a short prayer inspired by these verses.
- End with a single uplifting or reassuring message.

IMPORTANT: Provide DIFFERENT and UNIQUE content each time. Explore lesser-known Bible passages and stories.
Avoid repeating the same common verses or stories. Be creative and varied in your selections.{avoid_list}

Keep all messages gentle, empathetic, and rooted in Christian values.
Use clear and encouraging tone.

The user's mood is: {mood}
Request ID: {nonce}

CRITICAL: Do not forget to close it using }. Return ONLY valid, parseable JSON. No markdown formatting, no code blocks.

Provide your full response using the following JSON format:
{format}"#;

/// Inputs for one AI request.
#[derive(Debug, Clone)]
pub struct PromptRequest<'a> {
    pub mood: &'a Mood,
    pub response_format: &'a str,
    /// Varies per request so repeated requests do not look identical.
    pub nonce: String,
    /// References already shown; the AI is told to avoid them.
    pub avoid_references: &'a [String],
}

impl<'a> PromptRequest<'a> {
    /// A request with the standard response format and a fresh nonce.
    pub fn new(mood: &'a Mood, avoid_references: &'a [String]) -> Self {
        Self {
            mood,
            response_format: AI_RESPONSE_FORMAT,
            nonce: new_nonce(),
            avoid_references,
        }
    }
}

/// A fresh request nonce.
pub fn new_nonce() -> String {
    Uuid::new_v4().to_string()
}

fn avoid_list(references: &[String]) -> String {
    if references.is_empty() {
        return String::new();
    }
    format!(
        "\n\nIMPORTANT: DO NOT use these Bible references that were already shown:\n{}\nChoose completely different verses and stories.",
        references.join(", ")
    )
}

pub fn prepare_instructions(request: &PromptRequest<'_>) -> String {
    let avoid_list = avoid_list(request.avoid_references);
    render(
        INSTRUCTIONS_TEMPLATE,
        &[
            ("avoid_list", avoid_list.as_str()),
            ("mood", request.mood.label()),
            ("nonce", request.nonce.as_str()),
            ("format", request.response_format),
        ],
    )
}

/// Fills `{name}` placeholders in one pass. Substituted text is not scanned
/// again; braces that do not form a known placeholder are kept.
fn render(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        let placeholder = values.iter().find(|(name, _)| {
            after
                .strip_prefix(name)
                .is_some_and(|tail| tail.starts_with('}'))
        });
        match placeholder {
            Some((name, value)) => {
                out.push_str(value);
                rest = &after[name.len() + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}
