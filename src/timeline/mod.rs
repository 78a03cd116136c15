//! # Timeline Module
//!
//! Maps a project's ordered clip sequence onto a global composition timeline:
//! one audio track sourced from the song, a gap-free video track of clip
//! segments, and per-segment render instructions for the export backend. The
//! timeline is derived state; any project change invalidates it and it must
//! be rebuilt.

pub mod builder;
pub mod types;

pub use builder::{build, TRANSITION_WINDOW};
pub use types::{
    AudioTrack, OpacityRamp, RampShape, RenderInstruction, SkipReason, SkippedClip, Timeline,
    Transform, VideoSegment,
};
