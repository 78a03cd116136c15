use std::path::Path;

use tracing::debug;

use crate::error::Result;
use crate::project::Project;

/// Persist a project as a pretty-printed JSON document
pub fn save_project<P: AsRef<Path>>(project: &Project, path: P) -> Result<()> {
    let path = path.as_ref();
    let json = serde_json::to_string_pretty(project)
        .map_err(|e| crate::error::SongcutError::generic(format!("serialize project: {e}")))?;
    std::fs::write(path, json)?;
    debug!("Saved project {} to {:?}", project.id, path);
    Ok(())
}

/// Load a project previously written by [`save_project`]
pub fn load_project<P: AsRef<Path>>(path: P) -> Result<Project> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)?;
    let project = serde_json::from_str(&content)
        .map_err(|e| crate::error::SongcutError::generic(format!("parse project: {e}")))?;
    Ok(project)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{AudioAnalysis, KeyMoment, Mood};
    use crate::project::{Clip, ColorGrade, Song, Transition};
    use tempfile::tempdir;

    #[test]
    fn project_round_trips_field_for_field() {
        let mut song = Song::new("/music/track.mp3", "Track", 187.5);
        song.attach_analysis(AudioAnalysis {
            tempo: 124.0,
            energy: 0.8,
            mood: Mood::Energetic,
            key_moments: vec![KeyMoment {
                timestamp: 31.0,
                intensity: 0.9,
                description: "Intense moment".to_string(),
            }],
            themes: vec!["action".to_string(), "party".to_string()],
        });
        song.attach_lyrics("dance all night");

        let clips = vec![
            Clip::new("/media/a.mp4", 0.0, 4.0).with_transition(Transition::None),
            Clip::new("/media/b.mp4", 2.5, 5.0)
                .with_color_grade(ColorGrade::new(0.1, -0.2, 0.3, 0.0)),
        ];
        let project = Project::new(song, clips);

        let dir = tempdir().unwrap();
        let path = dir.path().join("project.json");
        save_project(&project, &path).unwrap();
        let loaded = load_project(&path).unwrap();

        assert_eq!(project, loaded);
    }
}
