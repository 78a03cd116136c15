use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use tokio::sync::watch;
use tokio::task;
use tracing::{debug, info, warn};

use crate::error::{ExportError, SongcutError};
use crate::export::backend::CancelFlag;
use crate::export::library::MediaLibrary;
use crate::export::pipeline::ExportPipeline;
use crate::media::probe::MediaProbe;
use crate::project::Project;
use crate::timeline;

/// Where one export attempt currently stands
#[derive(Debug, Clone, PartialEq)]
pub enum ExportState {
    Idle,
    Exporting,
    Completed(PathBuf),
    Failed(String),
}

impl ExportState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ExportState::Completed(_) | ExportState::Failed(_))
    }
}

/// Snapshot of the session published to observers
#[derive(Debug, Clone)]
pub struct ExportStatus {
    pub state: ExportState,

    /// Progress of the current attempt in [0, 1]
    pub progress: f64,

    /// Error from the most recent external save, if it failed
    ///
    /// Independent of `state`: a failed save never demotes a completed
    /// export.
    pub save_error: Option<String>,

    /// Attempt counter; bumped by `start` and `reset` so stale callbacks
    /// can be told apart from live ones
    pub attempt: u64,
}

impl ExportStatus {
    fn idle(attempt: u64) -> Self {
        Self {
            state: ExportState::Idle,
            progress: 0.0,
            save_error: None,
            attempt,
        }
    }
}

/// One project's export state machine
///
/// `Idle → Exporting → {Completed, Failed}`, with terminal states resettable
/// back to `Idle`. At most one export is in flight per session. All state
/// changes funnel through the session's mutex and are published as
/// [`ExportStatus`] snapshots over a watch channel, so progress callbacks
/// arriving from the backend's context are serialized and stale callbacks
/// from superseded attempts are dropped.
pub struct ExportSession {
    inner: Arc<Mutex<ExportStatus>>,
    tx: Arc<watch::Sender<ExportStatus>>,
    pipeline: Arc<ExportPipeline>,
    probe: Arc<dyn MediaProbe>,
    cancel: Mutex<Option<CancelFlag>>,
}

impl ExportSession {
    pub fn new(pipeline: ExportPipeline, probe: Arc<dyn MediaProbe>) -> Self {
        let status = ExportStatus::idle(0);
        let (tx, _rx) = watch::channel(status.clone());
        Self {
            inner: Arc::new(Mutex::new(status)),
            tx: Arc::new(tx),
            pipeline: Arc::new(pipeline),
            probe,
            cancel: Mutex::new(None),
        }
    }

    /// Current snapshot, synchronous read
    pub fn status(&self) -> ExportStatus {
        self.inner.lock().expect("session state poisoned").clone()
    }

    /// Subscribe to status snapshots
    pub fn subscribe(&self) -> watch::Receiver<ExportStatus> {
        self.tx.subscribe()
    }

    /// Begin exporting a project snapshot to `sink`
    ///
    /// Rejected with `ExportError::AlreadyRunning` while an attempt is in
    /// flight; the in-flight attempt is unaffected. The timeline is built and
    /// the pipeline driven on a background task; observers learn the outcome
    /// through [`ExportSession::subscribe`].
    pub fn start(&self, project: &Project, sink: PathBuf) -> Result<(), ExportError> {
        let attempt = {
            let mut status = self.inner.lock().expect("session state poisoned");
            if status.state == ExportState::Exporting {
                return Err(ExportError::AlreadyRunning);
            }

            status.attempt += 1;
            status.state = ExportState::Exporting;
            status.progress = 0.0;
            status.save_error = None;
            self.tx.send_replace(status.clone());
            status.attempt
        };

        let cancel = CancelFlag::new();
        *self.cancel.lock().expect("cancel slot poisoned") = Some(cancel.clone());

        info!("Starting export attempt {} for project {}", attempt, project.id);

        let project = project.clone();
        let probe = Arc::clone(&self.probe);
        let pipeline = Arc::clone(&self.pipeline);
        let inner = Arc::clone(&self.inner);
        let tx = Arc::clone(&self.tx);

        task::spawn(async move {
            let handle = SessionHandle { inner, tx };

            // Probing shells out, so the build runs off the async threads
            let build_probe = Arc::clone(&probe);
            let build_project = project.clone();
            let built = task::spawn_blocking(move || {
                timeline::build(&build_project, build_probe.as_ref())
            })
            .await;

            let timeline = match built {
                Ok(Ok(timeline)) => timeline,
                Ok(Err(build_err)) => {
                    let message = SongcutError::from(build_err).user_message();
                    handle.fail(attempt, message);
                    return;
                }
                Err(join_err) => {
                    handle.fail(attempt, format!("timeline build failed: {join_err}"));
                    return;
                }
            };

            let progress_handle = handle.clone();
            let result = pipeline
                .run(
                    &timeline,
                    &sink,
                    move |p| progress_handle.apply_progress(attempt, p),
                    cancel,
                )
                .await;

            match result {
                Ok(artifact) => handle.complete(attempt, artifact),
                Err(err) => handle.fail(attempt, err.user_message()),
            }
        });

        Ok(())
    }

    /// Request cancellation of the in-flight attempt, if any
    pub fn cancel(&self) {
        if let Some(flag) = self.cancel.lock().expect("cancel slot poisoned").as_ref() {
            debug!("Cancellation requested");
            flag.cancel();
        }
    }

    /// Return a terminal session to `Idle`, clearing progress, errors, and
    /// the recorded output. No-op outside terminal states.
    pub fn reset(&self) {
        let mut status = self.inner.lock().expect("session state poisoned");
        if !status.state.is_terminal() {
            return;
        }

        let attempt = status.attempt + 1;
        *status = ExportStatus::idle(attempt);
        self.tx.send_replace(status.clone());
        debug!("Session reset");
    }

    /// Save the completed artifact into an external media library
    ///
    /// A secondary, independently-failable action: failure is recorded in
    /// `save_error` and returned, but the session stays `Completed`.
    pub fn save_externally(&self, library: &MediaLibrary) -> Result<PathBuf, crate::error::LibraryError> {
        let artifact = {
            let status = self.inner.lock().expect("session state poisoned");
            match &status.state {
                ExportState::Completed(path) => path.clone(),
                _ => return Err(crate::error::LibraryError::NothingToSave),
            }
        };

        match library.import(&artifact) {
            Ok(saved) => {
                let mut status = self.inner.lock().expect("session state poisoned");
                status.save_error = None;
                self.tx.send_replace(status.clone());
                Ok(saved)
            }
            Err(err) => {
                warn!("External save failed: {}", err);
                let mut status = self.inner.lock().expect("session state poisoned");
                status.save_error = Some(err.to_string());
                self.tx.send_replace(status.clone());
                Err(err)
            }
        }
    }

    /// Wait until the current attempt reaches a terminal state
    pub async fn wait(&self) -> ExportStatus {
        let mut rx = self.subscribe();
        loop {
            let status = rx.borrow().clone();
            if status.state.is_terminal() {
                return status;
            }
            if rx.changed().await.is_err() {
                return self.status();
            }
        }
    }
}

/// Mutation endpoint handed to the export task
///
/// Every apply is keyed by the attempt it belongs to; anything from a
/// superseded attempt is dropped on the floor.
#[derive(Clone)]
struct SessionHandle {
    inner: Arc<Mutex<ExportStatus>>,
    tx: Arc<watch::Sender<ExportStatus>>,
}

impl SessionHandle {
    fn apply_progress(&self, attempt: u64, progress: f64) {
        let mut status = self.inner.lock().expect("session state poisoned");
        if status.attempt != attempt || status.state != ExportState::Exporting {
            return;
        }
        if progress > status.progress {
            status.progress = progress;
            self.tx.send_replace(status.clone());
        }
    }

    fn complete(&self, attempt: u64, artifact: PathBuf) {
        let mut status = self.inner.lock().expect("session state poisoned");
        if status.attempt != attempt || status.state != ExportState::Exporting {
            return;
        }
        status.progress = 1.0;
        status.state = ExportState::Completed(artifact);
        self.tx.send_replace(status.clone());
    }

    fn fail(&self, attempt: u64, message: String) {
        let mut status = self.inner.lock().expect("session state poisoned");
        if status.attempt != attempt || status.state != ExportState::Exporting {
            return;
        }
        status.state = ExportState::Failed(message);
        self.tx.send_replace(status.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ExportConfig, RenderConfig};
    use crate::export::backend::testing::SyntheticBackend;
    use crate::media::probe::{MediaInfo, StaticProbe};
    use crate::project::{Clip, Song};
    use std::time::Duration;
    use tempfile::tempdir;

    const SONG: &str = "/music/track.mp3";

    fn project(clips: Vec<Clip>) -> Project {
        Project::new(Song::new(SONG, "Track", 30.0), clips)
    }

    fn probe() -> Arc<StaticProbe> {
        Arc::new(
            StaticProbe::new()
                .insert(SONG, MediaInfo::audio(30.0))
                .insert("/media/a.mp4", MediaInfo::video(10.0))
                .insert("/media/b.mp4", MediaInfo::video(10.0)),
        )
    }

    fn session(backend: Arc<SyntheticBackend>) -> ExportSession {
        let export = ExportConfig {
            progress_interval_ms: 5,
        };
        let pipeline = ExportPipeline::new(RenderConfig::default(), &export, backend);
        ExportSession::new(pipeline, probe())
    }

    fn two_clip_project() -> Project {
        project(vec![
            Clip::new("/media/a.mp4", 0.0, 4.0),
            Clip::new("/media/b.mp4", 0.0, 5.0),
        ])
    }

    #[tokio::test]
    async fn export_runs_to_completion() {
        let dir = tempdir().unwrap();
        let sink = dir.path().join("out.mp4");
        let session = session(Arc::new(SyntheticBackend::completing(
            5,
            Duration::from_millis(10),
        )));

        let mut rx = session.subscribe();
        session.start(&two_clip_project(), sink.clone()).unwrap();

        let mut seen = Vec::new();
        loop {
            let status = rx.borrow_and_update().clone();
            seen.push(status.progress);
            if status.state.is_terminal() {
                assert_eq!(status.state, ExportState::Completed(sink.clone()));
                break;
            }
            rx.changed().await.unwrap();
        }

        assert!(seen.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(*seen.last().unwrap(), 1.0);
        assert!(sink.exists());
    }

    #[tokio::test]
    async fn start_while_exporting_is_rejected() {
        let dir = tempdir().unwrap();
        let sink = dir.path().join("out.mp4");
        let session = session(Arc::new(SyntheticBackend::completing(
            20,
            Duration::from_millis(10),
        )));

        session.start(&two_clip_project(), sink.clone()).unwrap();
        let second = session.start(&two_clip_project(), dir.path().join("other.mp4"));
        assert!(matches!(second, Err(ExportError::AlreadyRunning)));

        // The in-flight attempt is unaffected and still completes
        let terminal = session.wait().await;
        assert_eq!(terminal.state, ExportState::Completed(sink));
        assert_eq!(terminal.attempt, 1);
    }

    #[tokio::test]
    async fn empty_project_fails_before_the_backend_is_invoked() {
        let dir = tempdir().unwrap();
        let sink = dir.path().join("out.mp4");
        let backend = Arc::new(SyntheticBackend::completing(3, Duration::from_millis(1)));
        let session = session(Arc::clone(&backend));

        session.start(&project(vec![]), sink.clone()).unwrap();
        let terminal = session.wait().await;

        match terminal.state {
            ExportState::Failed(message) => assert!(message.contains("no clips")),
            other => panic!("expected failure, got {other:?}"),
        }
        assert_eq!(backend.invocation_count(), 0);
        assert!(!sink.exists());
    }

    #[tokio::test]
    async fn cancellation_lands_in_failed_with_clean_sink() {
        let dir = tempdir().unwrap();
        let sink = dir.path().join("out.mp4");
        let session = session(Arc::new(SyntheticBackend::completing(
            200,
            Duration::from_millis(10),
        )));

        session.start(&two_clip_project(), sink.clone()).unwrap();
        tokio::time::sleep(Duration::from_millis(40)).await;
        session.cancel();

        let terminal = session.wait().await;
        match terminal.state {
            ExportState::Failed(message) => assert!(message.to_lowercase().contains("cancelled")),
            other => panic!("expected failure, got {other:?}"),
        }
        assert!(!sink.exists());
    }

    #[tokio::test]
    async fn reset_returns_to_idle_and_clears_everything() {
        let dir = tempdir().unwrap();
        let sink = dir.path().join("out.mp4");
        let session = session(Arc::new(SyntheticBackend::completing(
            3,
            Duration::from_millis(5),
        )));

        session.start(&two_clip_project(), sink).unwrap();
        session.wait().await;

        session.reset();
        let status = session.status();
        assert_eq!(status.state, ExportState::Idle);
        assert_eq!(status.progress, 0.0);
        assert!(status.save_error.is_none());
    }

    #[tokio::test]
    async fn reset_is_a_no_op_while_exporting() {
        let dir = tempdir().unwrap();
        let sink = dir.path().join("out.mp4");
        let session = session(Arc::new(SyntheticBackend::completing(
            20,
            Duration::from_millis(10),
        )));

        session.start(&two_clip_project(), sink.clone()).unwrap();
        session.reset();
        assert_eq!(session.status().state, ExportState::Exporting);

        let terminal = session.wait().await;
        assert_eq!(terminal.state, ExportState::Completed(sink));
    }

    #[tokio::test]
    async fn stale_progress_is_suppressed_after_reset() {
        let dir = tempdir().unwrap();
        let sink = dir.path().join("out.mp4");
        let session = session(Arc::new(SyntheticBackend::completing(
            3,
            Duration::from_millis(5),
        )));

        session.start(&two_clip_project(), sink).unwrap();
        let old_attempt = session.status().attempt;
        session.wait().await;
        session.reset();

        // A straggler callback from the finished attempt must not resurface
        let handle = SessionHandle {
            inner: Arc::clone(&session.inner),
            tx: Arc::clone(&session.tx),
        };
        handle.apply_progress(old_attempt, 0.7);

        let status = session.status();
        assert_eq!(status.state, ExportState::Idle);
        assert_eq!(status.progress, 0.0);
    }

    #[tokio::test]
    async fn failed_save_does_not_demote_completed() {
        let dir = tempdir().unwrap();
        let sink = dir.path().join("out.mp4");
        let session = session(Arc::new(SyntheticBackend::completing(
            3,
            Duration::from_millis(5),
        )));

        session.start(&two_clip_project(), sink.clone()).unwrap();
        session.wait().await;

        // A library rooted at a file path cannot be created
        let bogus_root = sink.clone();
        let library = MediaLibrary::new(bogus_root.join("nested"));
        let result = session.save_externally(&library);

        assert!(result.is_err());
        let status = session.status();
        assert_eq!(status.state, ExportState::Completed(sink));
        assert!(status.save_error.is_some());
    }

    #[tokio::test]
    async fn successful_save_copies_into_the_library() {
        let dir = tempdir().unwrap();
        let sink = dir.path().join("out.mp4");
        let session = session(Arc::new(SyntheticBackend::completing(
            3,
            Duration::from_millis(5),
        )));

        session.start(&two_clip_project(), sink).unwrap();
        session.wait().await;

        let library = MediaLibrary::new(dir.path().join("library"));
        let saved = session.save_externally(&library).unwrap();
        assert!(saved.exists());
        assert!(session.status().save_error.is_none());
    }

    #[tokio::test]
    async fn save_without_completed_export_is_rejected() {
        let dir = tempdir().unwrap();
        let session = session(Arc::new(SyntheticBackend::completing(
            3,
            Duration::from_millis(5),
        )));

        let library = MediaLibrary::new(dir.path().join("library"));
        assert!(session.save_externally(&library).is_err());
    }
}
