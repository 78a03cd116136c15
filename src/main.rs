use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::{debug, info, warn, Level};

use songcut::{
    analysis::{extract_themes, HeuristicAnalyzer, SongAnalyzer, Transcriber, UnavailableTranscriber},
    config::Config,
    export::{ExportPipeline, ExportSession, ExportState, FfmpegBackend, MediaLibrary},
    media::{probe_song, ClipProvider, DirectoryClipProvider, FfprobeProbe},
    project::{save_project, Project, Song},
};

#[derive(Parser)]
#[command(
    name = "songcut",
    version,
    about = "Assemble video clips and a song into a timed composition",
    long_about = "Songcut analyzes a song, seeds a project from a directory of video clips, \
                  lays the clips out on a global timeline, and exports the composition to a \
                  single video file."
)]
struct Cli {
    /// Audio file path (WAV, MP3, FLAC)
    #[arg(short, long)]
    audio: PathBuf,

    /// Directory containing numbered video clips (01_intro.mp4, ...)
    #[arg(long)]
    clips: PathBuf,

    /// Output video file path
    #[arg(short, long)]
    output: PathBuf,

    /// Also save the project document next to the output
    #[arg(long)]
    project_out: Option<PathBuf>,

    /// Copy the finished export into the configured media library
    #[arg(long)]
    save_to_library: bool,

    /// Configuration file (optional)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt().with_max_level(log_level).init();

    info!("Starting Songcut v{}", env!("CARGO_PKG_VERSION"));
    info!("Audio: {:?}", cli.audio);
    info!("Clips: {:?}", cli.clips);
    info!("Output: {:?}", cli.output);

    let config = match cli.config {
        Some(config_path) => {
            info!("Loading configuration from {:?}", config_path);
            Config::from_file(&config_path)?
        }
        None => {
            info!("Using default configuration");
            Config::default()
        }
    };
    config.validate()?;

    // Ingest the song
    let song_info = probe_song(&cli.audio)?;
    let title = song_info.title.unwrap_or_else(|| {
        cli.audio
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "Untitled".to_string())
    });
    let mut song = Song::new(&cli.audio, title, song_info.duration);
    info!("Song: '{}' ({:.1}s)", song.title, song.duration);

    // Analysis is advisory; a failure only costs us theme hints
    let analyzer = HeuristicAnalyzer::new();
    match analyzer.analyze(&cli.audio, song.duration) {
        Ok(mut analysis) => {
            let transcriber = UnavailableTranscriber;
            match transcriber.transcribe(&cli.audio) {
                Ok(lyrics) => {
                    analysis.extend_themes(extract_themes(&lyrics));
                    song.attach_lyrics(lyrics);
                }
                Err(e) => debug!("Transcription skipped: {}", e),
            }

            info!(
                "Analysis: {:.0} bpm, {:?}, themes {:?}",
                analysis.tempo, analysis.mood, analysis.themes
            );
            song.attach_analysis(analysis);
        }
        Err(e) => warn!("Audio analysis failed, continuing without it: {}", e),
    }

    // Seed the project from the clip directory
    let probe = Arc::new(FfprobeProbe::new());
    let themes = song
        .analysis()
        .map(|analysis| analysis.themes.clone())
        .unwrap_or_default();
    let provider = DirectoryClipProvider::new(&cli.clips, probe.clone());
    let clips = provider.provide(&themes, song.duration)?;
    info!("Seeded {} clips from {:?}", clips.len(), cli.clips);

    let project = Project::new(song, clips);

    if let Some(project_path) = &cli.project_out {
        save_project(&project, project_path)?;
        info!("Project document saved to {:?}", project_path);
    }

    // Export
    let pipeline = ExportPipeline::new(
        config.render.clone(),
        &config.export,
        Arc::new(FfmpegBackend::new()),
    );
    let session = ExportSession::new(pipeline, probe);

    let mut rx = session.subscribe();
    session.start(&project, cli.output.clone())?;

    let mut last_logged = 0.0;
    let terminal = loop {
        let status = rx.borrow_and_update().clone();
        if status.state == ExportState::Exporting && status.progress >= last_logged + 0.1 {
            info!("Export progress: {:>3.0}%", status.progress * 100.0);
            last_logged = status.progress;
        }
        if status.state.is_terminal() {
            break status;
        }
        if rx.changed().await.is_err() {
            break session.status();
        }
    };

    match terminal.state {
        ExportState::Completed(artifact) => {
            info!("Export complete! Output saved to: {:?}", artifact);
            if cli.save_to_library {
                let library = MediaLibrary::new(&config.library.dir);
                match session.save_externally(&library) {
                    Ok(saved) => info!("Copied into library: {:?}", saved),
                    // Library failures never undo a finished export
                    Err(e) => warn!("Library save failed: {}", e),
                }
            }
            Ok(())
        }
        ExportState::Failed(message) => anyhow::bail!("export failed: {message}"),
        _ => anyhow::bail!("export ended in an unexpected state"),
    }
}
