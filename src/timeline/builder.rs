use tracing::{debug, info, warn};

use crate::error::BuildError;
use crate::media::probe::MediaProbe;
use crate::project::Project;
use crate::timeline::types::{
    AudioTrack, OpacityRamp, RenderInstruction, SkipReason, SkippedClip, Timeline, Transform,
    VideoSegment,
};

/// Length of the soft-entry window at the start of a transitioned segment
pub const TRANSITION_WINDOW: f64 = 0.5;

// Probed durations are approximate; a range that overshoots the source by
// less than this is still considered in bounds.
const RANGE_EPSILON: f64 = 1e-6;

/// Build the global timeline for a project snapshot
///
/// Pure with respect to its inputs: the same project and the same probe
/// results always yield the same timeline.
///
/// The audio track is the song's full source at global time zero; a song that
/// cannot be probed, or whose duration cannot be determined, fails the build.
/// Clips are concatenated in sequence order; a clip whose source cannot be
/// opened, has no video stream, or whose range does not fit the source is
/// skipped and recorded on the timeline, and global offsets are computed over
/// the included clips only. Skipping can produce a timeline with zero
/// segments — valid here, rejected by the export pipeline.
pub fn build(project: &Project, probe: &dyn MediaProbe) -> Result<Timeline, BuildError> {
    if project.is_empty() {
        return Err(BuildError::EmptyProject);
    }

    let song_path = &project.song.source;
    let song_info = probe.probe(song_path).map_err(|e| {
        warn!("Song probe failed: {}", e);
        BuildError::SongUnreadable {
            path: song_path.display().to_string(),
        }
    })?;

    if song_info.audio_streams == 0 {
        return Err(BuildError::SongUnreadable {
            path: song_path.display().to_string(),
        });
    }

    if song_info.duration <= 0.0 {
        return Err(BuildError::SongDurationUnknown {
            path: song_path.display().to_string(),
        });
    }

    let audio = AudioTrack {
        source: song_path.clone(),
        duration: song_info.duration,
    };

    let mut segments = Vec::new();
    let mut instructions = Vec::new();
    let mut skipped = Vec::new();
    let mut cursor = 0.0;

    for clip in project.clips() {
        let skip = |reason: SkipReason| SkippedClip {
            clip_id: clip.id,
            source: clip.source.clone(),
            reason,
        };

        if clip.start_time < 0.0 || clip.duration <= 0.0 {
            warn!("Skipping clip {:?}: invalid range", clip.source);
            skipped.push(skip(SkipReason::InvalidRange));
            continue;
        }

        let info = match probe.probe(&clip.source) {
            Ok(info) => info,
            Err(e) => {
                warn!("Skipping clip {:?}: {}", clip.source, e);
                skipped.push(skip(SkipReason::Unreadable(e.to_string())));
                continue;
            }
        };

        if info.video_streams == 0 {
            warn!("Skipping clip {:?}: no video stream", clip.source);
            skipped.push(skip(SkipReason::NoVideoStream));
            continue;
        }

        if clip.start_time + clip.duration > info.duration + RANGE_EPSILON {
            warn!(
                "Skipping clip {:?}: range {:.2}+{:.2}s exceeds source length {:.2}s",
                clip.source, clip.start_time, clip.duration, info.duration
            );
            skipped.push(skip(SkipReason::RangeOutOfBounds {
                available: info.duration,
            }));
            continue;
        }

        let opacity_ramp = clip.transition.is_soft().then(|| OpacityRamp {
            start: cursor,
            duration: TRANSITION_WINDOW.min(clip.duration),
            from: 0.0,
            to: 1.0,
            kind: clip.transition,
        });

        segments.push(VideoSegment {
            clip_id: clip.id,
            source: clip.source.clone(),
            source_start: clip.start_time,
            global_start: cursor,
            duration: clip.duration,
        });

        instructions.push(RenderInstruction {
            start: cursor,
            duration: clip.duration,
            transform: Transform::Identity,
            opacity_ramp,
            color_grade: clip.color_grade.filter(|grade| !grade.is_identity()),
        });

        debug!(
            "Placed clip {:?} at [{:.2}, {:.2})",
            clip.source,
            cursor,
            cursor + clip.duration
        );
        cursor += clip.duration;
    }

    info!(
        "Built timeline: {} segments ({} skipped), video {:.2}s over {:.2}s of audio",
        segments.len(),
        skipped.len(),
        cursor,
        audio.duration
    );

    Ok(Timeline {
        audio,
        segments,
        instructions,
        skipped,
    })
}
