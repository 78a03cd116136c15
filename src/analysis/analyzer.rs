use std::path::Path;
use std::sync::Mutex;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::analysis::types::{AudioAnalysis, KeyMoment, Mood};
use crate::error::AnalysisError;

/// Audio-analysis collaborator contract
///
/// Implementations take a playable audio source and its known duration and
/// produce tempo, energy, mood, key moments, and themes. Failure here is not
/// fatal to timeline composition when clips are supplied independently.
pub trait SongAnalyzer: Send + Sync {
    fn analyze(&self, source: &Path, duration: f64)
        -> Result<AudioAnalysis, AnalysisError>;
}

/// Simulated analyzer
///
/// Stands in for a real tempo/energy estimator: draws tempo and energy from
/// plausible ranges, classifies mood from the (tempo, energy) pair, and
/// spaces key moments roughly every fifteen seconds. Swap in a real
/// implementation at the integration boundary.
pub struct HeuristicAnalyzer {
    rng: Mutex<SmallRng>,
}

impl HeuristicAnalyzer {
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(SmallRng::from_entropy()),
        }
    }

    /// Deterministic analyzer for tests
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: Mutex::new(SmallRng::seed_from_u64(seed)),
        }
    }

    fn classify_mood(tempo: f64, energy: f64) -> Mood {
        if tempo >= 120.0 {
            if energy >= 0.7 {
                Mood::Energetic
            } else if energy >= 0.5 {
                Mood::Happy
            } else {
                Mood::Dramatic
            }
        } else if tempo >= 90.0 {
            if energy >= 0.7 {
                Mood::Aggressive
            } else if energy >= 0.4 {
                Mood::Romantic
            } else {
                Mood::Mysterious
            }
        } else if energy >= 0.5 {
            Mood::Calm
        } else {
            Mood::Sad
        }
    }

    fn key_moments(rng: &mut SmallRng, duration: f64) -> Vec<KeyMoment> {
        // One moment per ~15s of audio, never fewer than three
        let count = ((duration / 15.0) as usize).max(3);

        (0..count)
            .map(|i| {
                let timestamp = (duration / count as f64) * i as f64;
                let intensity: f64 = 0.3 + rng.gen_range(0.0..0.7);
                let description = if intensity > 0.7 {
                    "Intense moment"
                } else if intensity > 0.5 {
                    "Build up"
                } else {
                    "Calm section"
                };
                KeyMoment {
                    timestamp,
                    intensity,
                    description: description.to_string(),
                }
            })
            .collect()
    }
}

impl Default for HeuristicAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl SongAnalyzer for HeuristicAnalyzer {
    fn analyze(
        &self,
        source: &Path,
        duration: f64,
    ) -> Result<AudioAnalysis, AnalysisError> {
        if duration <= 0.0 {
            return Err(AnalysisError::InvalidSource {
                path: source.display().to_string(),
            });
        }

        let mut rng = self.rng.lock().expect("analyzer rng poisoned");

        let tempo: f64 = (120.0_f64 + rng.gen_range(-40.0..40.0)).clamp(60.0, 180.0);
        let energy: f64 = (0.3_f64 + rng.gen_range(0.0..0.7)).clamp(0.0, 1.0);
        let mood = Self::classify_mood(tempo, energy);
        let key_moments = Self::key_moments(&mut rng, duration);
        let themes = mood.themes();

        debug!(
            "Analyzed {:?}: {:.0} bpm, energy {:.2}, mood {:?}",
            source, tempo, energy, mood
        );

        Ok(AudioAnalysis {
            tempo,
            energy,
            mood,
            key_moments,
            themes,
        })
    }
}
