use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::analysis::AudioAnalysis;

/// The audio track a project is anchored to
///
/// Source and duration are fixed at ingestion. `analysis` and `lyrics` are
/// filled in at most once each by the external collaborators and are
/// immutable afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Song {
    pub id: Uuid,
    pub source: PathBuf,
    pub title: String,
    pub duration: f64,
    analysis: Option<AudioAnalysis>,
    lyrics: Option<String>,
}

impl Song {
    /// Create a song from an ingested audio source
    pub fn new<P: Into<PathBuf>, S: Into<String>>(source: P, title: S, duration: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            source: source.into(),
            title: title.into(),
            duration,
            analysis: None,
            lyrics: None,
        }
    }

    pub fn analysis(&self) -> Option<&AudioAnalysis> {
        self.analysis.as_ref()
    }

    pub fn lyrics(&self) -> Option<&str> {
        self.lyrics.as_deref()
    }

    /// Attach the analysis result. Returns false (and leaves the song
    /// untouched) when an analysis is already attached.
    pub fn attach_analysis(&mut self, analysis: AudioAnalysis) -> bool {
        if self.analysis.is_some() {
            return false;
        }
        self.analysis = Some(analysis);
        true
    }

    /// Attach the transcript. Returns false when lyrics are already attached.
    pub fn attach_lyrics<S: Into<String>>(&mut self, lyrics: S) -> bool {
        if self.lyrics.is_some() {
            return false;
        }
        self.lyrics = Some(lyrics.into());
        true
    }
}
