use std::fs::File;
use std::path::Path;

use symphonia::core::codecs::CODEC_TYPE_NULL;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::{MetadataOptions, StandardTagKey};
use symphonia::core::probe::Hint;
use tracing::debug;

use crate::error::ProbeError;

/// Metadata read from an audio source at ingestion time
#[derive(Debug, Clone)]
pub struct SongInfo {
    /// Track title from tags, when present
    pub title: Option<String>,

    /// Duration in seconds
    pub duration: f64,
}

/// Probe an audio file for its duration and title without decoding samples
pub fn probe_song<P: AsRef<Path>>(path: P) -> Result<SongInfo, ProbeError> {
    let path = path.as_ref();

    let file = File::open(path).map_err(|_| ProbeError::OpenFailed {
        path: path.display().to_string(),
    })?;

    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(extension) = path.extension().and_then(|ext| ext.to_str()) {
        hint.with_extension(extension);
    }

    let meta_opts: MetadataOptions = Default::default();
    let fmt_opts: FormatOptions = Default::default();

    let mut probed = symphonia::default::get_probe()
        .format(&hint, mss, &fmt_opts, &meta_opts)
        .map_err(|_| ProbeError::UnsupportedFormat {
            format: path
                .extension()
                .and_then(|ext| ext.to_str())
                .unwrap_or("unknown")
                .to_string(),
        })?;

    let format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| ProbeError::OpenFailed {
            path: path.display().to_string(),
        })?;

    let params = &track.codec_params;
    let duration = match (params.time_base, params.n_frames) {
        (Some(time_base), Some(frames)) => {
            let time = time_base.calc_time(frames);
            time.seconds as f64 + time.frac
        }
        _ => {
            return Err(ProbeError::ParseFailed {
                reason: format!("no duration in stream: {}", path.display()),
            })
        }
    };

    // Prefer the tagged title; the caller falls back to the file stem
    let title = probed
        .metadata
        .get()
        .as_ref()
        .and_then(|m| m.current().cloned())
        .and_then(|rev| {
            rev.tags()
                .iter()
                .find(|tag| tag.std_key == Some(StandardTagKey::TrackTitle))
                .map(|tag| tag.value.to_string())
        });

    debug!("Probed song {:?}: {:.1}s, title {:?}", path, duration, title);

    Ok(SongInfo { title, duration })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_fails_to_open() {
        let result = probe_song("/definitely/not/here.flac");
        assert!(matches!(result, Err(ProbeError::OpenFailed { .. })));
    }
}
