use serde::{Deserialize, Serialize};

/// Overall mood classification of a song
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mood {
    Happy,
    Sad,
    Energetic,
    Calm,
    Dramatic,
    Romantic,
    Mysterious,
    Aggressive,
}

impl Mood {
    /// Visual themes associated with this mood, used to seed clip search
    pub fn themes(&self) -> Vec<String> {
        let words: &[&str] = match self {
            Mood::Happy => &["sunshine", "celebration", "joy", "dance", "smiles"],
            Mood::Sad => &["rain", "melancholy", "solitude", "reflection", "memories"],
            Mood::Energetic => &["action", "movement", "excitement", "party", "sports"],
            Mood::Calm => &["nature", "peace", "meditation", "serenity", "ocean"],
            Mood::Dramatic => &["storm", "intensity", "conflict", "power", "cinema"],
            Mood::Romantic => &["love", "sunset", "couple", "heart", "intimacy"],
            Mood::Mysterious => &["fog", "shadows", "mystery", "night", "unknown"],
            Mood::Aggressive => &["fire", "energy", "rebellion", "strength", "urban"],
        };
        words.iter().map(|w| w.to_string()).collect()
    }
}

/// A notable point in the song worth emphasizing visually
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyMoment {
    /// Position in the song, seconds from the start
    pub timestamp: f64,

    /// How prominent the moment is (0.0-1.0)
    pub intensity: f64,

    /// Short human-readable label
    pub description: String,
}

/// Analysis result produced by the audio-analysis collaborator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioAnalysis {
    /// Estimated tempo in BPM (> 0)
    pub tempo: f64,

    /// Overall energy (0.0-1.0)
    pub energy: f64,

    /// Mood classification
    pub mood: Mood,

    /// Notable moments, ordered by timestamp
    pub key_moments: Vec<KeyMoment>,

    /// Visual themes derived from mood (and, when available, lyrics)
    pub themes: Vec<String>,
}

impl AudioAnalysis {
    /// Merge additional themes in, skipping duplicates and preserving order
    pub fn extend_themes<I: IntoIterator<Item = String>>(&mut self, extra: I) {
        for theme in extra {
            if !self.themes.contains(&theme) {
                self.themes.push(theme);
            }
        }
    }
}
