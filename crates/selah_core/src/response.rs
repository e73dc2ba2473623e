//! crates/selah_core/src/response.rs
//!
//! Normalizes what the AI chat capability returns and parses it into devotional content.

use crate::domain::{Prayer, Story, VerseFields};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Number of characters shown on each side of a parse error.
const EXCERPT_RADIUS: usize = 50;

//=========================================================================================
// Response shape
//=========================================================================================

/// One reply from the AI chat capability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub content: ChatContent,
}

impl ChatResponse {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: ChatContent::Text(text.into()),
        }
    }
}

/// Reply content arrives either as a plain string or as a list of parts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChatContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ContentPart {
    #[serde(default)]
    pub text: Option<String>,
}

impl ChatContent {
    /// The textual content: the string itself, or the first part's text.
    /// `None` when a part list carries no text at all.
    pub fn into_text(self) -> Option<String> {
        match self {
            ChatContent::Text(text) => Some(text),
            ChatContent::Parts(parts) => parts.into_iter().next().and_then(|part| part.text),
        }
    }
}

//=========================================================================================
// Parsed content
//=========================================================================================

/// The JSON document the AI is asked to produce. Fields are read one at a
/// time; a missing or ill-typed field is `None` and never rejects the rest.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AiDevotional {
    pub mood: Option<String>,
    pub summary: Option<String>,
    pub verses: Option<Vec<VerseFields>>,
    pub story: Option<Story>,
    pub prayer: Option<Prayer>,
    pub encouragement: Option<String>,
}

impl AiDevotional {
    pub fn from_value(document: &Value) -> Self {
        Self {
            mood: string_field(document, "mood"),
            summary: string_field(document, "summary"),
            verses: document
                .get("verses")
                .and_then(Value::as_array)
                .map(|verses| verses.iter().map(verse_fields).collect()),
            story: object_field(document, "story").map(|story| Story {
                title: string_field(story, "title"),
                reference: string_field(story, "reference"),
                text: string_field(story, "text"),
            }),
            prayer: object_field(document, "prayer").map(|prayer| Prayer {
                title: string_field(prayer, "title"),
                text: string_field(prayer, "text"),
            }),
            encouragement: string_field(document, "encouragement"),
        }
    }

    /// The first verse, if the document has any.
    pub fn first_verse(&self) -> Option<&VerseFields> {
        self.verses.as_ref().and_then(|verses| verses.first())
    }
}

fn verse_fields(verse: &Value) -> VerseFields {
    VerseFields {
        text: string_field(verse, "text"),
        reference: string_field(verse, "reference"),
        reflection: string_field(verse, "reflection"),
    }
}

/// Strings as they are; numbers in their JSON spelling.
fn string_field(value: &Value, key: &str) -> Option<String> {
    match value.get(key)? {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

fn object_field<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    value.get(key).filter(|field| field.is_object())
}

/// Where and why a response failed to parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseDiagnostics {
    pub message: String,
    /// Character offset of the failure within the response text.
    pub offset: usize,
    /// Up to `EXCERPT_RADIUS` characters on each side of `offset`.
    pub excerpt: String,
    /// The character at `offset`, if the failure is not at end of input.
    pub found: Option<char>,
}

impl fmt::Display for ParseDiagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (near character {})", self.message, self.offset)
    }
}

/// Fails only when `text` is not JSON at all.
pub fn parse_devotional(text: &str) -> Result<AiDevotional, ParseDiagnostics> {
    let document: Value = serde_json::from_str(text).map_err(|e| diagnose(text, &e))?;
    Ok(AiDevotional::from_value(&document))
}

/// Reads the first verse out of a caller-supplied JSON string.
pub fn parse_payload_verse(raw: &str) -> Option<VerseFields> {
    let document: Value = serde_json::from_str(raw).ok()?;
    AiDevotional::from_value(&document).verses?.into_iter().next()
}

fn diagnose(text: &str, error: &serde_json::Error) -> ParseDiagnostics {
    let offset = char_offset(text, error.line(), error.column());
    let start = offset.saturating_sub(EXCERPT_RADIUS);
    let excerpt: String = text
        .chars()
        .skip(start)
        .take(offset - start + EXCERPT_RADIUS)
        .collect();
    ParseDiagnostics {
        message: error.to_string(),
        offset,
        excerpt,
        found: text.chars().nth(offset),
    }
}

/// Converts serde_json's 1-based line/column into a character offset.
/// serde_json reports columns in bytes.
fn char_offset(text: &str, line: usize, column: usize) -> usize {
    let mut byte_offset = 0;
    for (index, current) in text.split_inclusive('\n').enumerate() {
        if index + 1 == line {
            byte_offset += column.saturating_sub(1).min(current.len());
            break;
        }
        byte_offset += current.len();
    }
    let mut byte_offset = byte_offset.min(text.len());
    while !text.is_char_boundary(byte_offset) {
        byte_offset -= 1;
    }
    text[..byte_offset].chars().count()
}
