use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::task;
use tracing::{debug, info, warn};

use crate::config::{ExportConfig, RenderConfig};
use crate::error::ExportError;
use crate::export::backend::{CancelFlag, ProgressSink, RenderBackend, RenderJob};
use crate::timeline::Timeline;

/// Drives one built timeline through the render backend to a finished file
///
/// The pipeline owns the filesystem contract of an export: the sink is
/// cleared up front, rendering happens at a sibling `.part` path, and the
/// artifact is renamed into place only on success, so a failed attempt never
/// leaves a partial file at the sink.
pub struct ExportPipeline {
    render: RenderConfig,
    progress_interval: Duration,
    backend: Arc<dyn RenderBackend>,
}

impl ExportPipeline {
    pub fn new(render: RenderConfig, export: &ExportConfig, backend: Arc<dyn RenderBackend>) -> Self {
        Self {
            render,
            progress_interval: Duration::from_millis(export.progress_interval_ms),
            backend,
        }
    }

    /// Render `timeline` to `sink`, reporting progress at a bounded interval
    ///
    /// Progress values forwarded to `on_progress` are non-decreasing; 1.0 is
    /// reported exactly once, after the artifact is in place. Cancellation
    /// resolves as `ExportError::Cancelled` with the sink left clean.
    pub async fn run<F>(
        &self,
        timeline: &Timeline,
        sink: &Path,
        on_progress: F,
        cancel: CancelFlag,
    ) -> Result<PathBuf, ExportError>
    where
        F: Fn(f64) + Send + Sync,
    {
        if timeline.is_empty() {
            return Err(ExportError::EmptyTimeline);
        }

        if !self.backend.is_available() {
            return Err(ExportError::BackendUnavailable {
                name: self.backend.name().to_string(),
            });
        }

        info!(
            "Exporting {:.2}s composition to {:?} via {}",
            timeline.output_duration(),
            sink,
            self.backend.name()
        );

        if let Some(parent) = sink.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| ExportError::CompositionFailed {
                    reason: format!("cannot create output directory: {e}"),
                })?;
        }

        // Repeated exports to the same sink overwrite the previous artifact
        match tokio::fs::remove_file(sink).await {
            Ok(()) => debug!("Removed previous artifact at {:?}", sink),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(ExportError::CompositionFailed {
                    reason: format!("cannot clear output sink: {e}"),
                })
            }
        }

        let part_path = part_path(sink);
        let progress = ProgressSink::new();

        let job = RenderJob {
            timeline: timeline.clone(),
            render: self.render.clone(),
            output: part_path.clone(),
        };
        let backend = Arc::clone(&self.backend);
        let backend_progress = progress.clone();
        let backend_cancel = cancel.clone();

        let mut render_task =
            task::spawn_blocking(move || backend.render(&job, &backend_progress, &backend_cancel));

        // Sample the backend's progress cell on a fixed cadence; 1.0 is
        // reserved for the success path below.
        let mut interval = tokio::time::interval(self.progress_interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        let mut last_reported = 0.0;

        let render_result = loop {
            tokio::select! {
                joined = &mut render_task => break joined,
                _ = interval.tick() => {
                    let current = progress.get().min(0.99);
                    if current > last_reported {
                        last_reported = current;
                        on_progress(current);
                    }
                }
            }
        };

        let outcome = match render_result {
            Ok(result) => result,
            Err(join_err) => Err(ExportError::EncodeFailed {
                reason: format!("render task failed: {join_err}"),
            }),
        };

        match outcome {
            Ok(()) => {
                tokio::fs::rename(&part_path, sink)
                    .await
                    .map_err(|e| ExportError::EncodeFailed {
                        reason: format!("cannot finalize artifact: {e}"),
                    })?;
                on_progress(1.0);
                info!("Export complete: {:?}", sink);
                Ok(sink.to_path_buf())
            }
            Err(err) => {
                if let Err(cleanup) = tokio::fs::remove_file(&part_path).await {
                    if cleanup.kind() != std::io::ErrorKind::NotFound {
                        warn!("Failed to remove partial artifact {:?}: {}", part_path, cleanup);
                    }
                }
                Err(err)
            }
        }
    }
}

/// Sibling path the backend renders into before the final rename
fn part_path(sink: &Path) -> PathBuf {
    let mut name = sink.file_name().unwrap_or_default().to_os_string();
    name.push(".part");
    sink.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::backend::testing::SyntheticBackend;
    use crate::media::probe::{MediaInfo, StaticProbe};
    use crate::project::{Clip, Project, Song};
    use crate::timeline;
    use std::sync::Mutex;
    use tempfile::tempdir;

    fn built_timeline() -> Timeline {
        let song = Song::new("/music/track.mp3", "Track", 30.0);
        let clips = vec![Clip::new("/media/a.mp4", 0.0, 4.0)];
        let project = Project::new(song, clips);
        let probe = StaticProbe::new()
            .insert("/music/track.mp3", MediaInfo::audio(30.0))
            .insert("/media/a.mp4", MediaInfo::video(10.0));
        timeline::build(&project, &probe).unwrap()
    }

    fn empty_timeline() -> Timeline {
        let song = Song::new("/music/track.mp3", "Track", 30.0);
        let clips = vec![Clip::new("/media/missing.mp4", 0.0, 4.0)];
        let project = Project::new(song, clips);
        let probe = StaticProbe::new().insert("/music/track.mp3", MediaInfo::audio(30.0));
        timeline::build(&project, &probe).unwrap()
    }

    fn pipeline(backend: Arc<SyntheticBackend>) -> ExportPipeline {
        let export = ExportConfig {
            progress_interval_ms: 5,
        };
        ExportPipeline::new(RenderConfig::default(), &export, backend)
    }

    #[tokio::test]
    async fn successful_run_places_artifact_and_ends_at_one() {
        let dir = tempdir().unwrap();
        let sink = dir.path().join("out.mp4");
        let backend = Arc::new(SyntheticBackend::completing(5, Duration::from_millis(10)));
        let pipeline = pipeline(Arc::clone(&backend));

        let observed = Arc::new(Mutex::new(Vec::new()));
        let sink_progress = Arc::clone(&observed);

        let timeline = built_timeline();
        let result = pipeline
            .run(
                &timeline,
                &sink,
                move |p| sink_progress.lock().unwrap().push(p),
                CancelFlag::new(),
            )
            .await;

        assert_eq!(result.unwrap(), sink);
        assert!(sink.exists());
        assert!(!part_path(&sink).exists());

        let values = observed.lock().unwrap();
        assert!(values.windows(2).all(|w| w[0] <= w[1]), "progress must be monotonic");
        assert_eq!(*values.last().unwrap(), 1.0);
        assert_eq!(values.iter().filter(|&&p| p == 1.0).count(), 1);
    }

    #[tokio::test]
    async fn empty_timeline_is_rejected_before_backend_runs() {
        let dir = tempdir().unwrap();
        let sink = dir.path().join("out.mp4");
        let backend = Arc::new(SyntheticBackend::completing(5, Duration::from_millis(1)));
        let pipeline = pipeline(Arc::clone(&backend));

        let result = pipeline
            .run(&empty_timeline(), &sink, |_| {}, CancelFlag::new())
            .await;

        assert!(matches!(result, Err(ExportError::EmptyTimeline)));
        assert_eq!(backend.invocation_count(), 0);
        assert!(!sink.exists());
    }

    #[tokio::test]
    async fn failure_leaves_no_partial_artifact() {
        let dir = tempdir().unwrap();
        let sink = dir.path().join("out.mp4");
        let backend = Arc::new(SyntheticBackend::failing_at(10, Duration::from_millis(5), 4));
        let pipeline = pipeline(backend);

        let result = pipeline
            .run(&built_timeline(), &sink, |_| {}, CancelFlag::new())
            .await;

        assert!(matches!(result, Err(ExportError::EncodeFailed { .. })));
        assert!(!sink.exists());
        assert!(!part_path(&sink).exists());
    }

    #[tokio::test]
    async fn cancellation_resolves_cancelled_with_clean_sink() {
        let dir = tempdir().unwrap();
        let sink = dir.path().join("out.mp4");
        let backend = Arc::new(SyntheticBackend::completing(200, Duration::from_millis(10)));
        let pipeline = pipeline(backend);

        let cancel = CancelFlag::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(30)).await;
            trigger.cancel();
        });

        let result = pipeline
            .run(&built_timeline(), &sink, |_| {}, cancel)
            .await;

        assert!(matches!(result, Err(ExportError::Cancelled)));
        assert!(!sink.exists());
        assert!(!part_path(&sink).exists());
    }

    #[tokio::test]
    async fn existing_artifact_is_overwritten() {
        let dir = tempdir().unwrap();
        let sink = dir.path().join("out.mp4");
        std::fs::write(&sink, b"stale").unwrap();

        let backend = Arc::new(SyntheticBackend::completing(3, Duration::from_millis(5)));
        let pipeline = pipeline(backend);

        pipeline
            .run(&built_timeline(), &sink, |_| {}, CancelFlag::new())
            .await
            .unwrap();

        assert_eq!(std::fs::read(&sink).unwrap(), b"rendered");
    }
}
