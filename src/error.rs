use thiserror::Error;

/// Main error type for the Songcut library
#[derive(Error, Debug)]
pub enum SongcutError {
    #[error("Timeline build error: {0}")]
    Build(#[from] BuildError),

    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    #[error("Media probe error: {0}")]
    Probe(#[from] ProbeError),

    #[error("Analysis error: {0}")]
    Analysis(#[from] AnalysisError),

    #[error("Clip fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Library error: {0}")]
    Library(#[from] LibraryError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Generic error: {0}")]
    Generic(String),
}

/// Errors raised while turning a project into a timeline
///
/// These are fatal to the current build attempt and are surfaced before any
/// render backend is invoked. One unreadable clip among many is NOT a build
/// error: the builder skips it and records the skip on the timeline.
#[derive(Error, Debug)]
pub enum BuildError {
    #[error("Project has no clips")]
    EmptyProject,

    #[error("Song source could not be read: {path}")]
    SongUnreadable { path: String },

    #[error("Song duration could not be determined: {path}")]
    SongDurationUnknown { path: String },
}

/// Errors raised by the export pipeline
#[derive(Error, Debug, Clone)]
pub enum ExportError {
    #[error("Timeline contains no video segments")]
    EmptyTimeline,

    #[error("An export is already in flight")]
    AlreadyRunning,

    #[error("Render backend unavailable: {name}")]
    BackendUnavailable { name: String },

    #[error("Composition could not be assembled: {reason}")]
    CompositionFailed { reason: String },

    #[error("Encoding failed: {reason}")]
    EncodeFailed { reason: String },

    #[error("Export was cancelled")]
    Cancelled,
}

/// Errors raised while probing media sources for metadata
#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("Failed to open media source: {path}")]
    OpenFailed { path: String },

    #[error("Unsupported media format: {format}")]
    UnsupportedFormat { format: String },

    #[error("Probe produced unreadable output: {reason}")]
    ParseFailed { reason: String },

    #[error("Probe tool not found: {tool}")]
    ToolMissing { tool: String },
}

/// Errors raised by the audio analysis and transcription collaborators
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Invalid audio source: {path}")]
    InvalidSource { path: String },

    #[error("Audio analysis failed: {reason}")]
    AnalysisFailed { reason: String },

    #[error("Transcription unavailable: {reason}")]
    TranscriptionUnavailable { reason: String },
}

/// Errors raised while fetching or discovering seed clips
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("No clips found in directory: {path}")]
    NoClipsFound { path: String },

    #[error("Clip discovery failed: {reason}")]
    DiscoveryFailed { reason: String },
}

/// Errors raised by the external media library (secondary save)
///
/// Kept separate from [`ExportError`] on purpose: a failed external save must
/// never be mistaken for a failed export.
#[derive(Error, Debug)]
pub enum LibraryError {
    #[error("No exported artifact to save")]
    NothingToSave,

    #[error("Failed to save into library: {reason}")]
    SaveFailed { reason: String },
}

/// Configuration-specific errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to parse configuration file: {path}")]
    ParseFailed { path: String },

    #[error("Invalid configuration value: {key} = {value}")]
    InvalidValue { key: String, value: String },

    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },
}

/// Convenience type alias for Results using SongcutError
pub type Result<T> = std::result::Result<T, SongcutError>;

impl SongcutError {
    /// Create a generic error with a custom message
    pub fn generic<S: Into<String>>(message: S) -> Self {
        Self::Generic(message.into())
    }

    /// Check if this error is recoverable (can be retried)
    pub fn is_recoverable(&self) -> bool {
        match self {
            // IO errors might be temporary
            Self::Io(_) => true,
            // Sources might become readable on retry
            Self::Build(BuildError::SongUnreadable { .. }) => true,
            Self::Probe(ProbeError::OpenFailed { .. }) => true,
            // Cancellation is always retryable by the caller
            Self::Export(ExportError::Cancelled) => true,
            // Most other errors are permanent
            _ => false,
        }
    }

    /// Get a user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            Self::Build(BuildError::EmptyProject) => {
                "The project has no clips. Add at least one clip before exporting.".to_string()
            }
            Self::Build(BuildError::SongUnreadable { path }) => {
                format!("Could not read the song file '{}'. Please check the file exists and is a supported format.", path)
            }
            Self::Build(BuildError::SongDurationUnknown { path }) => {
                format!("Could not determine the duration of '{}'.", path)
            }
            Self::Export(err) => err.user_message(),
            Self::Config(ConfigError::FileNotFound { path }) => {
                format!("Configuration file '{}' not found.", path)
            }
            _ => self.to_string(),
        }
    }
}

impl ExportError {
    /// User-facing message recorded in the export session's failed state
    pub fn user_message(&self) -> String {
        match self {
            Self::EmptyTimeline => {
                "Nothing to export: every clip was skipped or the timeline is empty.".to_string()
            }
            Self::AlreadyRunning => "An export is already running.".to_string(),
            Self::BackendUnavailable { name } => {
                format!("Render backend '{}' is not installed.", name)
            }
            Self::CompositionFailed { .. } => "Failed to assemble the video composition.".to_string(),
            Self::EncodeFailed { .. } => "Failed to encode the video.".to_string(),
            Self::Cancelled => "Export was cancelled.".to_string(),
        }
    }

    /// Whether this error is the cancellation classification
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}
