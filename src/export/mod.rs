//! # Export Module
//!
//! Drives a built timeline through an external render/encode backend and
//! tracks one export attempt from start to terminal outcome. The session is
//! the single owner of observable export state; the backend runs as an
//! independent worker whose progress reports are marshaled back through the
//! session before anything observable changes.

pub mod backend;
pub mod library;
pub mod pipeline;
pub mod session;

pub use backend::{CancelFlag, FfmpegBackend, ProgressSink, RenderBackend, RenderJob};
pub use library::MediaLibrary;
pub use pipeline::ExportPipeline;
pub use session::{ExportSession, ExportState, ExportStatus};
