//! # Songcut
//!
//! Assemble a sequence of video clips and one song into a timed composition
//! and export it to a single video file.
//!
//! The crate is organized around a small pipeline: a [`project`] holds a song
//! and an ordered clip sequence; the [`timeline`] builder maps that sequence
//! onto a global timeline with per-segment render instructions; the
//! [`export`] pipeline drives an external render backend to produce the final
//! artifact while an export session tracks progress and terminal state.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use songcut::{
//!     config::Config,
//!     export::{ExportPipeline, ExportSession, FfmpegBackend},
//!     media::FfprobeProbe,
//!     project::{Clip, Project, Song},
//! };
//!
//! # #[tokio::main]
//! # async fn main() -> anyhow::Result<()> {
//! let config = Config::default();
//! let song = Song::new("song.mp3", "My Song", 180.0);
//! let mut project = Project::new(song, vec![]);
//! project.add_clip(Clip::new("clips/01_intro.mp4", 0.0, 5.0));
//!
//! let pipeline = ExportPipeline::new(
//!     config.render.clone(),
//!     &config.export,
//!     Arc::new(FfmpegBackend::new()),
//! );
//! let session = ExportSession::new(pipeline, Arc::new(FfprobeProbe::new()));
//! session.start(&project, "output.mp4".into())?;
//! let outcome = session.wait().await;
//! println!("{:?}", outcome.state);
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`project`] - Song, clip, and project value types plus persistence
//! - [`timeline`] - Pure timeline construction from a project snapshot
//! - [`export`] - Export pipeline, render backends, and the session state machine
//! - [`analysis`] - Audio-analysis and transcription collaborator contracts
//! - [`media`] - Media probing and seed-clip discovery
//! - [`config`] - Configuration management

pub mod analysis;
pub mod config;
pub mod error;
pub mod export;
pub mod media;
pub mod project;
pub mod timeline;

// Re-export commonly used types for convenience
pub use crate::{
    config::Config,
    error::{Result, SongcutError},
    export::{ExportSession, ExportState, ExportStatus},
    project::{Clip, ColorGrade, Project, Song, Transition},
    timeline::Timeline,
};
