//! crates/selah_core/src/fallback.rs
//!
//! Static verses used whenever the AI is unavailable or answers with nothing usable.

use crate::domain::{Mood, VerseEntry};

/// The mood whose entry stands in for unrecognized moods.
pub const DEFAULT_MOOD: Mood = Mood::Happy;

/// Returns the canonical verse for a mood, or the default mood's verse for
/// moods outside the table.
pub fn fallback_verse(mood: &Mood) -> VerseEntry {
    let (text, reference, reflection) = match mood {
        Mood::Happy | Mood::Other(_) => (
            "This is the day that the Lord has made; let us rejoice and be glad in it.",
            "Psalm 118:24",
            "Joy is a gift from God. Celebrate this moment and share your happiness with others.",
        ),
        Mood::Sad => (
            "The Lord is close to the brokenhearted and saves those who are crushed in spirit.",
            "Psalm 34:18",
            "In your sadness, remember that God is near. He sees your tears and holds you close.",
        ),
        Mood::Anxious => (
            "Do not be anxious about anything, but in every situation, by prayer and petition, with thanksgiving, present your requests to God.",
            "Philippians 4:6",
            "Anxiety can feel overwhelming, but God invites you to bring your worries to Him in prayer.",
        ),
        Mood::Grateful => (
            "Give thanks to the Lord, for he is good; his love endures forever.",
            "Psalm 107:1",
            "Gratitude opens our hearts to see God's goodness in every moment of our lives.",
        ),
        Mood::Lonely => (
            "The Lord himself goes before you and will be with you; he will never leave you nor forsake you.",
            "Deuteronomy 31:8",
            "Even in loneliness, you are never truly alone. God walks beside you always.",
        ),
        Mood::Angry => (
            "In your anger do not sin: Do not let the sun go down while you are still angry.",
            "Ephesians 4:26",
            "Anger is a natural emotion, but God calls us to process it with wisdom and grace.",
        ),
        Mood::Peaceful => (
            "Peace I leave with you; my peace I give you. I do not give to you as the world gives.",
            "John 14:27",
            "True peace comes from Christ. Rest in His presence and let His calm fill your soul.",
        ),
        Mood::Hopeless => (
            "For I know the plans I have for you, declares the Lord, plans to prosper you and not to harm you, plans to give you hope and a future.",
            "Jeremiah 29:11",
            "Even in the darkest moments, God has a plan for your life. Hope is never lost when we trust in Him.",
        ),
    };
    VerseEntry::new(text, reference, reflection)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_recognized_mood_has_a_complete_entry() {
        for mood in Mood::ALL.iter() {
            let verse = fallback_verse(mood);
            assert!(!verse.text.is_empty(), "{mood} has no text");
            assert!(!verse.reference.is_empty(), "{mood} has no reference");
            assert!(!verse.reflection.is_empty(), "{mood} has no reflection");
        }
    }

    #[test]
    fn references_are_distinct_per_mood() {
        let mut references: Vec<String> = Mood::ALL
            .iter()
            .map(|m| fallback_verse(m).reference)
            .collect();
        references.sort();
        references.dedup();
        assert_eq!(references.len(), Mood::ALL.len());
    }

    #[test]
    fn unrecognized_mood_uses_default_entry() {
        let other = fallback_verse(&Mood::Other("Bored".to_string()));
        assert_eq!(other, fallback_verse(&DEFAULT_MOOD));
        assert_eq!(other.reference, "Psalm 118:24");
    }

    #[test]
    fn peaceful_entry_is_john_14_27() {
        assert_eq!(fallback_verse(&Mood::Peaceful).reference, "John 14:27");
    }
}
