use std::path::PathBuf;

use uuid::Uuid;

use crate::project::{ColorGrade, Transition};

/// Spatial transform applied to a segment
///
/// Placeholder for future spatial effects; today every segment renders
/// unmoved at full frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transform {
    Identity,
}

/// Shape of a segment's entry ramp, selected by the transition kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RampShape {
    /// Straight opacity blend
    Linear,
    /// Slow start, full by the end of the window
    EaseIn,
    /// Left-to-right reveal
    Sweep,
    /// Previous frame pushed out while the new one slides in
    Slide,
}

/// Opacity ramp covering the start of a segment
///
/// Every non-none transition produces a soft entry: opacity 0 to 1 over a
/// short window at the segment start. The kind is carried along so backends
/// that support more than a plain blend can shape the treatment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OpacityRamp {
    /// Global time the ramp begins (= segment start)
    pub start: f64,

    /// Ramp length in seconds
    pub duration: f64,

    pub from: f32,
    pub to: f32,

    /// The transition that requested this ramp
    pub kind: Transition,
}

impl OpacityRamp {
    pub fn end(&self) -> f64 {
        self.start + self.duration
    }

    pub fn shape(&self) -> RampShape {
        match self.kind {
            Transition::None | Transition::CrossDissolve => RampShape::Linear,
            Transition::Fade => RampShape::EaseIn,
            Transition::Wipe => RampShape::Sweep,
            Transition::Push => RampShape::Slide,
        }
    }
}

/// Per-segment instruction for the render backend
#[derive(Debug, Clone, PartialEq)]
pub struct RenderInstruction {
    /// Global start of the segment this instruction spans
    pub start: f64,

    /// Segment length in seconds
    pub duration: f64,

    pub transform: Transform,

    /// Present iff the clip's transition is not `None`
    pub opacity_ramp: Option<OpacityRamp>,

    /// Grade metadata for the backend; the builder never touches pixels
    pub color_grade: Option<ColorGrade>,
}

impl RenderInstruction {
    pub fn end(&self) -> f64 {
        self.start + self.duration
    }
}

/// The song placed at global time zero for its full duration
#[derive(Debug, Clone, PartialEq)]
pub struct AudioTrack {
    pub source: PathBuf,
    pub duration: f64,
}

/// One clip mapped onto the global video track
#[derive(Debug, Clone, PartialEq)]
pub struct VideoSegment {
    pub clip_id: Uuid,
    pub source: PathBuf,

    /// Offset into the source media
    pub source_start: f64,

    /// Offset on the global timeline (cumulative over included clips)
    pub global_start: f64,

    pub duration: f64,
}

impl VideoSegment {
    pub fn global_end(&self) -> f64 {
        self.global_start + self.duration
    }
}

/// Why a clip was left out of the timeline
#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    /// Source could not be opened or probed
    Unreadable(String),

    /// Source opened but reported no video stream
    NoVideoStream,

    /// Clip range is not a valid `[start, start + duration)` window
    InvalidRange,

    /// Clip range extends past the end of the source
    RangeOutOfBounds { available: f64 },
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::Unreadable(reason) => write!(f, "source unreadable: {reason}"),
            SkipReason::NoVideoStream => write!(f, "no video stream"),
            SkipReason::InvalidRange => write!(f, "invalid clip range"),
            SkipReason::RangeOutOfBounds { available } => {
                write!(f, "range exceeds source length ({available:.2}s available)")
            }
        }
    }
}

/// A clip the builder dropped, with the reason, so droppage is observable
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedClip {
    pub clip_id: Uuid,
    pub source: PathBuf,
    pub reason: SkipReason,
}

/// The derived, globally time-ordered arrangement of a project's audio and
/// video, consumed only by the export pipeline
#[derive(Debug, Clone, PartialEq)]
pub struct Timeline {
    pub audio: AudioTrack,
    pub segments: Vec<VideoSegment>,
    pub instructions: Vec<RenderInstruction>,
    pub skipped: Vec<SkippedClip>,
}

impl Timeline {
    /// Total length of the video track: the sum of included clip durations
    pub fn video_duration(&self) -> f64 {
        self.segments
            .last()
            .map(|segment| segment.global_end())
            .unwrap_or(0.0)
    }

    /// Whether any clip made it onto the video track
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Duration the rendered artifact is expected to have
    ///
    /// The backend stops at the shorter of the two tracks, matching the
    /// encoder's behavior when video and audio lengths differ.
    pub fn output_duration(&self) -> f64 {
        if self.is_empty() {
            0.0
        } else {
            self.video_duration().min(self.audio.duration)
        }
    }
}
