use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::debug;

use crate::error::ProbeError;

/// Metadata reported for one media source
#[derive(Debug, Clone, PartialEq)]
pub struct MediaInfo {
    /// Container duration in seconds
    pub duration: f64,

    /// Number of video streams
    pub video_streams: u32,

    /// Number of audio streams
    pub audio_streams: u32,

    /// Width of the first video stream, if any
    pub width: Option<u32>,

    /// Height of the first video stream, if any
    pub height: Option<u32>,

    /// Frame rate of the first video stream, if any
    pub fps: Option<f64>,
}

impl MediaInfo {
    /// Shorthand for an audio-only source
    pub fn audio(duration: f64) -> Self {
        Self {
            duration,
            video_streams: 0,
            audio_streams: 1,
            width: None,
            height: None,
            fps: None,
        }
    }

    /// Shorthand for a video source with one video stream
    pub fn video(duration: f64) -> Self {
        Self {
            duration,
            video_streams: 1,
            audio_streams: 0,
            width: Some(1920),
            height: Some(1080),
            fps: Some(30.0),
        }
    }
}

/// Contract for probing media sources
///
/// The timeline builder asks a probe whether sources can be opened and what
/// they contain; swapping the implementation is how tests avoid touching the
/// filesystem.
pub trait MediaProbe: Send + Sync {
    fn probe(&self, path: &Path) -> Result<MediaInfo, ProbeError>;
}

/// Probe backed by the external `ffprobe` tool
pub struct FfprobeProbe;

impl FfprobeProbe {
    pub fn new() -> Self {
        Self
    }

    /// Whether ffprobe can be spawned at all
    pub fn is_available() -> bool {
        Command::new("ffprobe")
            .arg("-version")
            .output()
            .map(|out| out.status.success())
            .unwrap_or(false)
    }
}

impl Default for FfprobeProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl MediaProbe for FfprobeProbe {
    fn probe(&self, path: &Path) -> Result<MediaInfo, ProbeError> {
        if !path.exists() {
            return Err(ProbeError::OpenFailed {
                path: path.display().to_string(),
            });
        }

        let output = Command::new("ffprobe")
            .args([
                "-v",
                "error",
                "-print_format",
                "json",
                "-show_format",
                "-show_streams",
            ])
            .arg(path)
            .output()
            .map_err(|_| ProbeError::ToolMissing {
                tool: "ffprobe".to_string(),
            })?;

        if !output.status.success() {
            return Err(ProbeError::OpenFailed {
                path: path.display().to_string(),
            });
        }

        let json: serde_json::Value =
            serde_json::from_slice(&output.stdout).map_err(|e| ProbeError::ParseFailed {
                reason: e.to_string(),
            })?;

        let duration = json["format"]["duration"]
            .as_str()
            .and_then(|s| s.parse::<f64>().ok())
            .unwrap_or(0.0);

        let mut info = MediaInfo {
            duration,
            video_streams: 0,
            audio_streams: 0,
            width: None,
            height: None,
            fps: None,
        };

        for stream in json["streams"].as_array().into_iter().flatten() {
            match stream["codec_type"].as_str() {
                Some("video") => {
                    if info.video_streams == 0 {
                        info.width = stream["width"].as_u64().map(|w| w as u32);
                        info.height = stream["height"].as_u64().map(|h| h as u32);
                        info.fps = stream["r_frame_rate"]
                            .as_str()
                            .or_else(|| stream["avg_frame_rate"].as_str())
                            .and_then(parse_frame_rate);
                    }
                    info.video_streams += 1;
                }
                Some("audio") => info.audio_streams += 1,
                _ => {}
            }
        }

        debug!(
            "Probed {:?}: {:.1}s, {} video / {} audio streams",
            path, info.duration, info.video_streams, info.audio_streams
        );

        Ok(info)
    }
}

/// Parse a frame rate expressed as "30/1", "30000/1001", or "29.97"
fn parse_frame_rate(raw: &str) -> Option<f64> {
    if let Some((num, den)) = raw.split_once('/') {
        let num: f64 = num.parse().ok()?;
        let den: f64 = den.parse().ok()?;
        if den == 0.0 {
            return None;
        }
        return Some(num / den);
    }
    raw.parse().ok()
}

/// In-memory probe for tests and dry runs
///
/// Paths registered with [`StaticProbe::insert`] return their recorded info;
/// everything else fails to open.
#[derive(Default)]
pub struct StaticProbe {
    entries: HashMap<PathBuf, MediaInfo>,
}

impl StaticProbe {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert<P: Into<PathBuf>>(mut self, path: P, info: MediaInfo) -> Self {
        self.entries.insert(path.into(), info);
        self
    }
}

impl MediaProbe for StaticProbe {
    fn probe(&self, path: &Path) -> Result<MediaInfo, ProbeError> {
        self.entries
            .get(path)
            .cloned()
            .ok_or_else(|| ProbeError::OpenFailed {
                path: path.display().to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_rate_parses_both_forms() {
        assert_eq!(parse_frame_rate("30/1"), Some(30.0));
        assert_eq!(parse_frame_rate("29.97"), Some(29.97));
        let ntsc = parse_frame_rate("30000/1001").unwrap();
        assert!((ntsc - 29.97).abs() < 0.01);
        assert_eq!(parse_frame_rate("30/0"), None);
        assert_eq!(parse_frame_rate("abc"), None);
    }

    #[test]
    fn static_probe_returns_registered_info() {
        let probe = StaticProbe::new().insert("/media/a.mp4", MediaInfo::video(10.0));
        assert_eq!(
            probe.probe(Path::new("/media/a.mp4")).unwrap().duration,
            10.0
        );
        assert!(probe.probe(Path::new("/media/missing.mp4")).is_err());
    }
}
