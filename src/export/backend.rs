use std::io::{BufRead, BufReader, Read};
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::config::RenderConfig;
use crate::error::ExportError;
use crate::project::ColorGrade;
use crate::timeline::Timeline;

/// Cooperative cancellation flag shared between the caller and the backend
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Monotonic progress cell written by the backend, sampled by the pipeline
///
/// Stores an f64 in [0, 1] behind an atomic; `set` never moves the value
/// backwards, so readers observe a non-decreasing sequence no matter how the
/// backend reports.
#[derive(Debug, Clone, Default)]
pub struct ProgressSink(Arc<AtomicU64>);

impl ProgressSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, progress: f64) {
        let clamped = progress.clamp(0.0, 1.0);
        let mut current = self.0.load(Ordering::Acquire);
        loop {
            if f64::from_bits(current) >= clamped {
                return;
            }
            match self.0.compare_exchange_weak(
                current,
                clamped.to_bits(),
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return,
                Err(observed) => current = observed,
            }
        }
    }

    pub fn get(&self) -> f64 {
        f64::from_bits(self.0.load(Ordering::Acquire))
    }
}

/// Everything a backend needs to render one export attempt
#[derive(Debug, Clone)]
pub struct RenderJob {
    pub timeline: Timeline,
    pub render: RenderConfig,

    /// Temporary output path; the pipeline renames it into place on success
    pub output: PathBuf,
}

/// Contract for render/encode backends
///
/// `render` blocks until the artifact at `job.output` is complete, the job
/// fails, or cancellation is observed. Implementations write progress into
/// the sink as they go and must return `ExportError::Cancelled` (after
/// stopping their work) when the flag is raised.
pub trait RenderBackend: Send + Sync {
    fn name(&self) -> &str;

    fn is_available(&self) -> bool;

    fn render(
        &self,
        job: &RenderJob,
        progress: &ProgressSink,
        cancel: &CancelFlag,
    ) -> Result<(), ExportError>;
}

/// Backend driving the external `ffmpeg` binary
///
/// Each video segment becomes one trimmed input; the filter graph normalizes
/// segments to the target resolution/rate, applies the per-segment grade and
/// entry fade, and concatenates them over the song audio. Progress is parsed
/// from ffmpeg's `-progress` key/value stream.
pub struct FfmpegBackend;

impl FfmpegBackend {
    pub fn new() -> Self {
        Self
    }

    /// Build the complete ffmpeg argument list for a job
    pub fn build_args(job: &RenderJob) -> Vec<String> {
        let timeline = &job.timeline;
        let render = &job.render;
        let mut args: Vec<String> = vec!["-v".into(), "error".into()];

        for segment in &timeline.segments {
            args.push("-ss".into());
            args.push(format!("{:.6}", segment.source_start));
            args.push("-t".into());
            args.push(format!("{:.6}", segment.duration));
            args.push("-i".into());
            args.push(segment.source.display().to_string());
        }

        let audio_index = timeline.segments.len();
        args.push("-i".into());
        args.push(timeline.audio.source.display().to_string());

        args.push("-filter_complex".into());
        args.push(Self::build_filter_graph(job));

        args.push("-map".into());
        args.push("[vout]".into());
        args.push("-map".into());
        args.push(format!("{audio_index}:a"));

        args.push("-c:v".into());
        args.push(render.codec.clone());
        args.push("-crf".into());
        args.push(render.crf().to_string());
        args.push("-r".into());
        args.push(render.fps.to_string());
        args.push("-pix_fmt".into());
        args.push("yuv420p".into());
        args.push("-c:a".into());
        args.push("aac".into());
        args.push("-shortest".into());

        args.push("-progress".into());
        args.push("pipe:1".into());
        args.push("-stats_period".into());
        args.push("0.1".into());
        args.push("-nostats".into());

        args.push("-y".into());
        args.push(job.output.display().to_string());

        args
    }

    /// Per-segment normalize/grade/fade chains feeding one concat
    fn build_filter_graph(job: &RenderJob) -> String {
        let render = &job.render;
        let (w, h) = (render.width, render.height);
        let mut graph = String::new();

        for (i, instruction) in job.timeline.instructions.iter().enumerate() {
            let mut chain = format!(
                "[{i}:v]scale={w}:{h}:force_original_aspect_ratio=decrease,\
                 pad={w}:{h}:(ow-iw)/2:(oh-ih)/2,setsar=1,fps={fps}",
                fps = render.fps
            );

            if let Some(grade) = &instruction.color_grade {
                chain.push(',');
                chain.push_str(&Self::grade_filter(grade));
            }

            if let Some(ramp) = &instruction.opacity_ramp {
                // Fade timing is relative to the trimmed segment stream, and
                // the ramp always sits at the segment start.
                chain.push_str(&format!(",fade=t=in:st=0:d={:.3}", ramp.duration));
            }

            graph.push_str(&chain);
            graph.push_str(&format!("[v{i}];"));
        }

        for i in 0..job.timeline.instructions.len() {
            graph.push_str(&format!("[v{i}]"));
        }
        graph.push_str(&format!(
            "concat=n={}:v=1:a=0[vout]",
            job.timeline.instructions.len()
        ));

        graph
    }

    /// Map the normalized grade onto ffmpeg's eq/colortemperature parameters
    fn grade_filter(grade: &ColorGrade) -> String {
        // eq: brightness is additive in [-1,1]; contrast and saturation are
        // multipliers around 1.0. Warmth rides on colortemperature Kelvin.
        let mut filter = format!(
            "eq=brightness={:.3}:contrast={:.3}:saturation={:.3}",
            grade.brightness,
            1.0 + grade.contrast,
            1.0 + grade.saturation,
        );
        if grade.temperature != 0.0 {
            let kelvin = 6500.0 - grade.temperature * 1500.0;
            filter.push_str(&format!(",colortemperature=temperature={kelvin:.0}"));
        }
        filter
    }
}

impl Default for FfmpegBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderBackend for FfmpegBackend {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    fn is_available(&self) -> bool {
        Command::new("ffmpeg")
            .arg("-version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|status| status.success())
            .unwrap_or(false)
    }

    fn render(
        &self,
        job: &RenderJob,
        progress: &ProgressSink,
        cancel: &CancelFlag,
    ) -> Result<(), ExportError> {
        let args = Self::build_args(job);
        debug!("Running ffmpeg with {} args", args.len());

        let mut child = Command::new("ffmpeg")
            .args(&args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| ExportError::CompositionFailed {
                reason: format!("failed to start ffmpeg: {e}"),
            })?;

        let stdout = child.stdout.take().ok_or_else(|| ExportError::CompositionFailed {
            reason: "failed to capture ffmpeg stdout".to_string(),
        })?;
        let stderr = child.stderr.take().ok_or_else(|| ExportError::CompositionFailed {
            reason: "failed to capture ffmpeg stderr".to_string(),
        })?;

        // Drain stderr concurrently so ffmpeg never blocks on a full pipe
        let stderr_task = std::thread::spawn(move || -> String {
            let mut reader = BufReader::new(stderr);
            let mut output = String::new();
            match reader.read_to_string(&mut output) {
                Ok(_) => output,
                Err(err) => format!("<failed to read ffmpeg stderr: {err}>"),
            }
        });

        let expected = job.timeline.output_duration();
        let mut reader = BufReader::new(stdout);
        let mut line = String::new();
        let mut killed = false;

        loop {
            if cancel.is_cancelled() && !killed {
                if let Err(e) = child.kill() {
                    warn!("Failed to kill ffmpeg: {}", e);
                }
                killed = true;
            }

            line.clear();
            let bytes = reader.read_line(&mut line).map_err(|e| ExportError::EncodeFailed {
                reason: format!("failed reading ffmpeg progress: {e}"),
            })?;
            if bytes == 0 {
                break;
            }

            if let Some((key, value)) = line.trim().split_once('=') {
                // ffmpeg reports out_time_ms in microseconds; out_time_us is
                // its better-named alias in newer builds
                if matches!(key, "out_time_ms" | "out_time_us") {
                    if let (Ok(us), true) = (value.parse::<f64>(), expected > 0.0) {
                        progress.set((us / 1_000_000.0) / expected);
                    }
                }
            }
        }

        let status = child.wait().map_err(|e| ExportError::EncodeFailed {
            reason: format!("failed to wait on ffmpeg: {e}"),
        })?;

        let stderr_output = stderr_task
            .join()
            .unwrap_or_else(|_| "<failed to join stderr reader>".to_string());

        if cancel.is_cancelled() {
            return Err(ExportError::Cancelled);
        }

        if !status.success() {
            return Err(ExportError::EncodeFailed {
                reason: format!("ffmpeg exited with {}: {}", status, stderr_output.trim()),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    /// Scripted backend for pipeline and session tests: ticks progress in
    /// fixed steps, honors cancellation, and can be told to fail mid-encode.
    pub struct SyntheticBackend {
        pub steps: u32,
        pub step_delay: Duration,
        pub fail_at: Option<u32>,
        pub invocations: AtomicUsize,
    }

    impl SyntheticBackend {
        pub fn completing(steps: u32, step_delay: Duration) -> Self {
            Self {
                steps,
                step_delay,
                fail_at: None,
                invocations: AtomicUsize::new(0),
            }
        }

        pub fn failing_at(steps: u32, step_delay: Duration, fail_at: u32) -> Self {
            Self {
                steps,
                step_delay,
                fail_at: Some(fail_at),
                invocations: AtomicUsize::new(0),
            }
        }

        pub fn invocation_count(&self) -> usize {
            self.invocations.load(Ordering::SeqCst)
        }
    }

    impl RenderBackend for SyntheticBackend {
        fn name(&self) -> &str {
            "synthetic"
        }

        fn is_available(&self) -> bool {
            true
        }

        fn render(
            &self,
            job: &RenderJob,
            progress: &ProgressSink,
            cancel: &CancelFlag,
        ) -> Result<(), ExportError> {
            self.invocations.fetch_add(1, Ordering::SeqCst);

            for step in 1..=self.steps {
                if cancel.is_cancelled() {
                    return Err(ExportError::Cancelled);
                }
                if self.fail_at == Some(step) {
                    // Leave a partial artifact behind; cleaning it up is the
                    // pipeline's job.
                    let _ = std::fs::write(&job.output, b"partial");
                    return Err(ExportError::EncodeFailed {
                        reason: "synthetic encode failure".to_string(),
                    });
                }
                std::thread::sleep(self.step_delay);
                progress.set(step as f64 / self.steps as f64);
            }

            std::fs::write(&job.output, b"rendered").map_err(|e| ExportError::EncodeFailed {
                reason: e.to_string(),
            })?;
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::probe::{MediaInfo, StaticProbe};
    use crate::project::{Clip, ColorGrade, Project, Song, Transition};

    fn job() -> RenderJob {
        let song = Song::new("/music/track.mp3", "Track", 30.0);
        let clips = vec![
            Clip::new("/media/a.mp4", 1.0, 4.0).with_transition(Transition::None),
            Clip::new("/media/b.mp4", 0.0, 5.0)
                .with_color_grade(ColorGrade::new(0.1, 0.2, 0.0, -0.5)),
        ];
        let project = Project::new(song, clips);
        let probe = StaticProbe::new()
            .insert("/music/track.mp3", MediaInfo::audio(30.0))
            .insert("/media/a.mp4", MediaInfo::video(10.0))
            .insert("/media/b.mp4", MediaInfo::video(10.0));
        let timeline = crate::timeline::build(&project, &probe).unwrap();

        RenderJob {
            timeline,
            render: crate::config::RenderConfig::default(),
            output: "/tmp/out.mp4.part".into(),
        }
    }

    #[test]
    fn progress_sink_is_monotonic() {
        let sink = ProgressSink::new();
        sink.set(0.5);
        sink.set(0.3);
        assert_eq!(sink.get(), 0.5);
        sink.set(0.9);
        assert_eq!(sink.get(), 0.9);
        sink.set(7.0);
        assert_eq!(sink.get(), 1.0);
    }

    #[test]
    fn args_trim_each_segment_input() {
        let args = FfmpegBackend::build_args(&job());
        let joined = args.join(" ");

        // One -ss/-t/-i triple per segment, audio input last
        assert_eq!(args.iter().filter(|a| *a == "-ss").count(), 2);
        assert!(joined.contains("-ss 1.000000 -t 4.000000 -i /media/a.mp4"));
        assert!(joined.contains("-i /music/track.mp3"));
        assert!(joined.contains("-map [vout] -map 2:a"));
        assert!(joined.contains("-shortest"));
        assert!(joined.ends_with("/tmp/out.mp4.part"));
    }

    #[test]
    fn filter_graph_carries_fade_and_grade() {
        let args = FfmpegBackend::build_args(&job());
        let graph = &args[args.iter().position(|a| a == "-filter_complex").unwrap() + 1];

        assert!(graph.contains("concat=n=2:v=1:a=0[vout]"));
        // Clip 1 is a hard cut, clip 2 dissolves in over the fixed window
        assert_eq!(graph.matches("fade=t=in").count(), 1);
        assert!(graph.contains("fade=t=in:st=0:d=0.500"));
        // The grade rides on eq + colortemperature
        assert!(graph.contains("eq=brightness=0.100:contrast=1.200:saturation=1.000"));
        assert!(graph.contains("colortemperature=temperature=7250"));
    }

    #[test]
    fn identity_temperature_skips_the_kelvin_filter() {
        let grade = ColorGrade::new(0.5, 0.0, 0.0, 0.0);
        let filter = FfmpegBackend::grade_filter(&grade);
        assert!(!filter.contains("colortemperature"));
    }
}
