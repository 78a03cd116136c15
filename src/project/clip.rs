use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Visual treatment applied at a clip segment's entry point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Transition {
    /// Hard cut, no treatment
    None,
    /// Soft blend from the previous segment
    CrossDissolve,
    /// Fade up from black
    Fade,
    /// Horizontal wipe
    Wipe,
    /// Push the previous segment out of frame
    Push,
}

impl Transition {
    /// Whether this transition produces a soft entry (an opacity ramp)
    pub fn is_soft(&self) -> bool {
        !matches!(self, Transition::None)
    }
}

/// Normalized four-parameter color adjustment attached to a clip
///
/// All values live in [-1, 1]; zero everywhere is the identity grade. The
/// grade is carried as metadata on the render instruction, the render backend
/// does the pixel work.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColorGrade {
    pub brightness: f64,
    pub contrast: f64,
    pub saturation: f64,
    pub temperature: f64,
}

impl ColorGrade {
    /// Create a grade with each parameter clamped to [-1, 1]
    pub fn new(brightness: f64, contrast: f64, saturation: f64, temperature: f64) -> Self {
        Self {
            brightness: brightness.clamp(-1.0, 1.0),
            contrast: contrast.clamp(-1.0, 1.0),
            saturation: saturation.clamp(-1.0, 1.0),
            temperature: temperature.clamp(-1.0, 1.0),
        }
    }

    /// Whether this grade leaves pixels untouched
    pub fn is_identity(&self) -> bool {
        self.brightness == 0.0
            && self.contrast == 0.0
            && self.saturation == 0.0
            && self.temperature == 0.0
    }
}

impl Default for ColorGrade {
    fn default() -> Self {
        Self::new(0.0, 0.0, 0.0, 0.0)
    }
}

/// A reference to a time-bounded segment of a source media file plus
/// presentation metadata
///
/// Clips are value objects: editing the transition or grade produces a
/// replacement clip that callers store back into the project. The range
/// invariants (`start_time >= 0`, `duration > 0`, range within the source) are
/// validated when the timeline is built, not at construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clip {
    pub id: Uuid,
    pub source: PathBuf,
    pub start_time: f64,
    pub duration: f64,
    pub transition: Transition,
    pub color_grade: Option<ColorGrade>,
}

impl Clip {
    /// Create a new clip over `[start_time, start_time + duration)` of the
    /// source media, with the default cross-dissolve entry
    pub fn new<P: Into<PathBuf>>(source: P, start_time: f64, duration: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            source: source.into(),
            start_time,
            duration,
            transition: Transition::CrossDissolve,
            color_grade: None,
        }
    }

    /// Replacement clip with a different transition
    pub fn with_transition(mut self, transition: Transition) -> Self {
        self.transition = transition;
        self
    }

    /// Replacement clip with a color grade attached
    pub fn with_color_grade(mut self, grade: ColorGrade) -> Self {
        self.color_grade = Some(grade);
        self
    }
}
