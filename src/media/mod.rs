//! # Media Module
//!
//! Source-media metadata probing and seed-clip discovery. The timeline
//! builder and the CLI consume these through narrow traits so that real
//! probing can be swapped for in-memory doubles.

pub mod audio;
pub mod fetch;
pub mod probe;

pub use audio::{probe_song, SongInfo};
pub use fetch::{ClipProvider, DirectoryClipProvider, SampleClipProvider};
pub use probe::{FfprobeProbe, MediaInfo, MediaProbe, StaticProbe};
