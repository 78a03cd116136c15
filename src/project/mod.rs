//! # Project Model
//!
//! Value types describing a song, a video clip, and a project that binds an
//! ordered clip sequence to that song. All mutation operations are
//! synchronous, total, and never perform I/O; out-of-bounds edits are no-ops
//! rather than errors.

pub mod clip;
pub mod song;
pub mod store;

mod project;

pub use clip::{Clip, ColorGrade, Transition};
pub use project::Project;
pub use song::Song;
pub use store::{load_project, save_project};
