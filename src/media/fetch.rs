use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, warn};

use crate::error::FetchError;
use crate::media::probe::MediaProbe;
use crate::project::Clip;

/// Media-fetch collaborator contract
///
/// Given the analysis themes and a target duration, produce an ordered list
/// of candidate clips to seed a new project. The core imposes nothing on clip
/// provenance beyond the clip invariants themselves.
pub trait ClipProvider: Send + Sync {
    fn provide(&self, themes: &[String], target_duration: f64) -> Result<Vec<Clip>, FetchError>;
}

const MEDIA_EXTENSIONS: &[&str] = &["mp4", "mov", "avi", "mkv", "webm"];

/// Clips discovered from a local directory of media files
///
/// Files named `01_intro.mp4`, `02_chorus.mov`, ... are ordered by their
/// numeric prefix; anything else falls back to name order after the numbered
/// ones. The target duration is split evenly across the discovered files,
/// capped per clip at the probed source length. Themes are ignored: the user
/// curated this media themselves.
pub struct DirectoryClipProvider {
    dir: PathBuf,
    probe: Arc<dyn MediaProbe>,
}

impl DirectoryClipProvider {
    pub fn new<P: Into<PathBuf>>(dir: P, probe: Arc<dyn MediaProbe>) -> Self {
        Self {
            dir: dir.into(),
            probe,
        }
    }

    /// Parse the numeric prefix from a filename like "01_intro"
    fn sequence_number(stem: &str) -> Option<u32> {
        let (prefix, _) = stem.split_once('_')?;
        prefix.parse().ok()
    }
}

impl ClipProvider for DirectoryClipProvider {
    fn provide(&self, _themes: &[String], target_duration: f64) -> Result<Vec<Clip>, FetchError> {
        let entries = std::fs::read_dir(&self.dir).map_err(|_| FetchError::NoClipsFound {
            path: self.dir.display().to_string(),
        })?;

        let mut files: Vec<(Option<u32>, PathBuf)> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| {
                path.extension()
                    .and_then(|ext| ext.to_str())
                    .map(|ext| MEDIA_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
                    .unwrap_or(false)
            })
            .map(|path| {
                let seq = path
                    .file_stem()
                    .and_then(|stem| stem.to_str())
                    .and_then(Self::sequence_number);
                (seq, path)
            })
            .collect();

        files.sort_by(|a, b| match (a.0, b.0) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => a.1.cmp(&b.1),
        });

        if files.is_empty() {
            return Err(FetchError::NoClipsFound {
                path: self.dir.display().to_string(),
            });
        }

        let share = target_duration / files.len() as f64;
        let mut clips = Vec::new();

        for (_, path) in files {
            match self.probe.probe(&path) {
                Ok(info) if info.video_streams > 0 && info.duration > 0.0 => {
                    let duration = share.min(info.duration);
                    debug!("Discovered clip {:?} ({:.1}s of {:.1}s)", path, duration, info.duration);
                    clips.push(Clip::new(path, 0.0, duration));
                }
                Ok(_) => warn!("Skipping {:?}: no video stream", path),
                Err(e) => warn!("Skipping {:?}: {}", path, e),
            }
        }

        if clips.is_empty() {
            return Err(FetchError::DiscoveryFailed {
                reason: format!("no usable media in {}", self.dir.display()),
            });
        }

        Ok(clips)
    }
}

/// Simulated fetch collaborator
///
/// Fabricates placeholder clips of roughly five seconds each until the target
/// duration is covered, the way a stock-media search result would seed a
/// project. The placeholder sources do not exist on disk; the timeline
/// builder's skip policy handles them unless real media is substituted.
pub struct SampleClipProvider {
    rng: Mutex<SmallRng>,
}

impl SampleClipProvider {
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(SmallRng::from_entropy()),
        }
    }

    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: Mutex::new(SmallRng::seed_from_u64(seed)),
        }
    }
}

impl Default for SampleClipProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl ClipProvider for SampleClipProvider {
    fn provide(&self, themes: &[String], target_duration: f64) -> Result<Vec<Clip>, FetchError> {
        if target_duration <= 0.0 {
            return Err(FetchError::DiscoveryFailed {
                reason: "target duration must be positive".to_string(),
            });
        }

        let mut rng = self.rng.lock().expect("fetch rng poisoned");
        let theme_hint = themes.first().map(|t| t.as_str()).unwrap_or("sample");

        let mut clips = Vec::new();
        let mut current = 0.0;
        let mut index = 0usize;

        while current < target_duration {
            let jitter: f64 = rng.gen_range(-1.0..1.0);
            let duration = (5.0 + jitter).min(target_duration - current);
            if duration <= 0.0 {
                break;
            }

            clips.push(Clip::new(
                format!("/tmp/{theme_hint}_clip_{index}.mp4"),
                0.0,
                duration,
            ));
            current += duration;
            index += 1;
        }

        Ok(clips)
    }
}
