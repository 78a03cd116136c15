use std::path::Path;

use crate::error::AnalysisError;

/// Transcription collaborator contract
///
/// Optional: callers swallow failures and proceed without lyrics.
pub trait Transcriber: Send + Sync {
    fn transcribe(&self, source: &Path) -> Result<String, AnalysisError>;
}

/// Placeholder transcriber for environments without a speech-to-text service
pub struct UnavailableTranscriber;

impl Transcriber for UnavailableTranscriber {
    fn transcribe(&self, _source: &Path) -> Result<String, AnalysisError> {
        Err(AnalysisError::TranscriptionUnavailable {
            reason: "no speech-to-text service configured".to_string(),
        })
    }
}

const THEME_KEYWORDS: &[&str] = &[
    "love", "heart", "night", "day", "sky", "star", "moon", "dream", "hope", "pain", "joy",
    "dance", "sing", "light", "dark", "fire", "water", "wind", "rain", "sun", "time",
];

/// Extract visual themes from a transcript by keyword scan
pub fn extract_themes(lyrics: &str) -> Vec<String> {
    let lowered = lyrics.to_lowercase();
    THEME_KEYWORDS
        .iter()
        .filter(|keyword| lowered.contains(**keyword))
        .map(|keyword| keyword.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn themes_are_found_case_insensitively() {
        let themes = extract_themes("Dancing under the MOON, dreaming of rain");
        assert!(themes.contains(&"moon".to_string()));
        assert!(themes.contains(&"rain".to_string()));
        assert!(themes.contains(&"dream".to_string()));
    }

    #[test]
    fn no_keywords_yields_no_themes() {
        assert!(extract_themes("instrumental interlude").is_empty());
    }

    #[test]
    fn unavailable_transcriber_fails() {
        let transcriber = UnavailableTranscriber;
        assert!(transcriber.transcribe(Path::new("/music/track.mp3")).is_err());
    }
}
