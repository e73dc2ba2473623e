//! crates/selah_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs carry no knowledge of the web layer or the AI vendor.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

//=========================================================================================
// Mood
//=========================================================================================

/// The emotional state a user picks. Labels outside the recognized set are kept
/// verbatim in `Other` so they can still be sent to the AI.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Mood {
    Happy,
    Sad,
    Anxious,
    Grateful,
    Lonely,
    Angry,
    Peaceful,
    Hopeless,
    Other(String),
}

impl Mood {
    /// The recognized moods, in mood-picker order.
    pub const ALL: [Mood; 8] = [
        Mood::Happy,
        Mood::Sad,
        Mood::Anxious,
        Mood::Grateful,
        Mood::Lonely,
        Mood::Angry,
        Mood::Peaceful,
        Mood::Hopeless,
    ];

    pub fn label(&self) -> &str {
        match self {
            Mood::Happy => "Happy",
            Mood::Sad => "Sad",
            Mood::Anxious => "Anxious",
            Mood::Grateful => "Grateful",
            Mood::Lonely => "Lonely",
            Mood::Angry => "Angry",
            Mood::Peaceful => "Peaceful",
            Mood::Hopeless => "Hopeless",
            Mood::Other(label) => label,
        }
    }

    /// The emoji shown on the mood card. `None` for unrecognized moods.
    pub fn emoji(&self) -> Option<&'static str> {
        let emoji = match self {
            Mood::Happy => "😃",
            Mood::Sad => "😢",
            Mood::Anxious => "😰",
            Mood::Grateful => "🙏",
            Mood::Lonely => "😔",
            Mood::Angry => "😠",
            Mood::Peaceful => "🕊️",
            Mood::Hopeless => "😞",
            Mood::Other(_) => return None,
        };
        Some(emoji)
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, Mood::Other(_))
    }
}

impl FromStr for Mood {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let mood = Mood::ALL
            .iter()
            .find(|m| m.label().eq_ignore_ascii_case(trimmed))
            .cloned()
            .unwrap_or_else(|| Mood::Other(trimmed.to_string()));
        Ok(mood)
    }
}

impl From<String> for Mood {
    fn from(value: String) -> Self {
        match value.parse() {
            Ok(mood) => mood,
            Err(never) => match never {},
        }
    }
}

impl From<Mood> for String {
    fn from(value: Mood) -> Self {
        value.label().to_string()
    }
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

//=========================================================================================
// Devotional content
//=========================================================================================

/// A Bible verse with its reference and a short reflection.
/// `reference` is the key used to avoid showing the same verse twice.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct VerseEntry {
    pub text: String,
    pub reference: String,
    pub reflection: String,
}

impl VerseEntry {
    pub fn new(text: &str, reference: &str, reflection: &str) -> Self {
        Self {
            text: text.to_string(),
            reference: reference.to_string(),
            reflection: reflection.to_string(),
        }
    }

    /// The verse as a quoted line followed by its reference.
    pub fn clipboard_text(&self) -> String {
        format!("\"{}\"\n— {}", self.text, self.reference)
    }
}

/// A Bible story related to the mood.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Story {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Prayer {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

/// Everything the verse panel displays for one generation.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DevotionalBundle {
    pub verse: VerseEntry,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub story: Option<Story>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prayer: Option<Prayer>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encouragement: Option<String>,
}

impl DevotionalBundle {
    pub fn from_verse(verse: VerseEntry) -> Self {
        Self {
            verse,
            ..Self::default()
        }
    }

    /// Drops everything except the verse.
    pub fn clear_extras(&mut self) {
        self.summary = None;
        self.story = None;
        self.prayer = None;
        self.encouragement = None;
    }
}

//=========================================================================================
// External verse payload
//=========================================================================================

/// Verse fields as they arrive from outside; any of them may be missing.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct VerseFields {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub reference: Option<String>,
    #[serde(default)]
    pub reflection: Option<String>,
}

impl VerseFields {
    pub fn into_entry(self) -> VerseEntry {
        VerseEntry {
            text: self.text.unwrap_or_default(),
            reference: self.reference.unwrap_or_default(),
            reflection: self.reflection.unwrap_or_default(),
        }
    }
}

/// A verse supplied by the caller instead of asking the AI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VersePayload {
    /// Already structured verse fields.
    Structured(VerseFields),
    /// A string expected to hold a JSON document with a `verses` array.
    Raw(String),
}

//=========================================================================================
// Used references
//=========================================================================================

/// The references already shown in this session, oldest first.
/// Only ever grows; a new session starts with an empty set.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct UsedReferenceSet {
    references: Vec<String>,
}

impl UsedReferenceSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, reference: impl Into<String>) {
        let reference = reference.into();
        if !reference.trim().is_empty() {
            self.references.push(reference);
        }
    }

    pub fn extend<I, S>(&mut self, references: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for reference in references {
            self.push(reference);
        }
    }

    pub fn as_slice(&self) -> &[String] {
        &self.references
    }

    pub fn is_empty(&self) -> bool {
        self.references.is_empty()
    }

    pub fn len(&self) -> usize {
        self.references.len()
    }
}

impl<S: Into<String>> FromIterator<S> for UsedReferenceSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = Self::new();
        set.extend(iter);
        set
    }
}

//=========================================================================================
// Auth
//=========================================================================================

/// A signed-in browser session (auth cookie).
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub id: String,
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

impl AuthSession {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mood_parses_labels_case_insensitively() {
        assert_eq!("anxious".parse::<Mood>().unwrap(), Mood::Anxious);
        assert_eq!(" PEACEFUL ".parse::<Mood>().unwrap(), Mood::Peaceful);
        assert_eq!(
            "Curious".parse::<Mood>().unwrap(),
            Mood::Other("Curious".to_string())
        );
    }

    #[test]
    fn mood_serializes_as_label() {
        let json = serde_json::to_string(&Mood::Grateful).unwrap();
        assert_eq!(json, "\"Grateful\"");
        let mood: Mood = serde_json::from_str("\"lonely\"").unwrap();
        assert_eq!(mood, Mood::Lonely);
        let other: Mood = serde_json::from_str("\"Tired\"").unwrap();
        assert_eq!(other.label(), "Tired");
        assert!(!other.is_recognized());
        assert!(other.emoji().is_none());
    }

    #[test]
    fn verse_payload_accepts_both_shapes() {
        let structured: VersePayload =
            serde_json::from_str(r#"{"text":"T","reference":"R"}"#).unwrap();
        assert_eq!(
            structured,
            VersePayload::Structured(VerseFields {
                text: Some("T".to_string()),
                reference: Some("R".to_string()),
                reflection: None,
            })
        );

        let raw: VersePayload = serde_json::from_str(r#""{\"verses\":[]}""#).unwrap();
        assert_eq!(raw, VersePayload::Raw("{\"verses\":[]}".to_string()));
    }

    #[test]
    fn missing_verse_fields_default_to_empty() {
        let entry = VerseFields {
            text: Some("T".to_string()),
            ..VerseFields::default()
        }
        .into_entry();
        assert_eq!(entry, VerseEntry::new("T", "", ""));
    }

    #[test]
    fn used_references_keep_order_and_skip_blanks() {
        let mut used = UsedReferenceSet::new();
        used.push("R1");
        used.push("  ");
        used.extend(["R2", "R1"]);
        assert_eq!(used.as_slice(), ["R1", "R2", "R1"]);
    }

    #[test]
    fn clipboard_text_quotes_verse_and_appends_reference() {
        let verse = VerseEntry::new("Peace", "John 14:27", "");
        assert_eq!(verse.clipboard_text(), "\"Peace\"\n— John 14:27");
    }
}
