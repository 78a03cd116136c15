//! # Audio Analysis Collaborators
//!
//! Boundary contracts for the audio-analysis and transcription services. The
//! core only depends on the data shapes here; the bundled implementations are
//! deliberate simulations standing in for real DSP and speech-to-text, which
//! live outside this crate.

pub mod analyzer;
pub mod transcript;
pub mod types;

pub use analyzer::{HeuristicAnalyzer, SongAnalyzer};
pub use transcript::{extract_themes, Transcriber, UnavailableTranscriber};
pub use types::{AudioAnalysis, KeyMoment, Mood};
