use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::project::{Clip, Song};

/// A song plus the ordered clip sequence that will play over it
///
/// Clip order is playback order on the global timeline. The project owns its
/// clips exclusively; every structural mutation refreshes `modified_at`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: Uuid,
    pub song: Song,
    clips: Vec<Clip>,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

impl Project {
    /// Create a project around a song, optionally seeded with clips
    pub fn new(song: Song, clips: Vec<Clip>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            song,
            clips,
            created_at: now,
            modified_at: now,
        }
    }

    pub fn clips(&self) -> &[Clip] {
        &self.clips
    }

    pub fn clip(&self, index: usize) -> Option<&Clip> {
        self.clips.get(index)
    }

    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }

    pub fn len(&self) -> usize {
        self.clips.len()
    }

    /// Append a clip to the end of the sequence
    pub fn add_clip(&mut self, clip: Clip) {
        self.clips.push(clip);
        self.touch();
    }

    /// Replace the clip at `index`. Out of bounds is a no-op; callers are
    /// expected to validate indices, the model never raises.
    pub fn update_clip(&mut self, index: usize, clip: Clip) {
        if index >= self.clips.len() {
            return;
        }
        self.clips[index] = clip;
        self.touch();
    }

    /// Remove the clip at `index`. Out of bounds is a no-op. If an editor
    /// held `index` as its selection, clearing the selection is the caller's
    /// job.
    pub fn remove_clip(&mut self, index: usize) {
        if index >= self.clips.len() {
            return;
        }
        self.clips.remove(index);
        self.touch();
    }

    /// Move the clips at `from` (contiguous or not) so they start at `to`,
    /// preserving their relative order.
    ///
    /// Semantics are remove-then-reinsert: the source clips are taken out in
    /// their original order and reinserted starting at `to`, where `to` is
    /// interpreted against the sequence *after* removal (and clamped to it).
    /// Invalid or duplicate source indices are ignored; an effectively empty
    /// move leaves the project untouched.
    pub fn move_clips(&mut self, from: &[usize], to: usize) {
        let mut indices: Vec<usize> = from
            .iter()
            .copied()
            .filter(|&i| i < self.clips.len())
            .collect();
        indices.sort_unstable();
        indices.dedup();

        if indices.is_empty() {
            return;
        }

        let moved: Vec<Clip> = indices.iter().map(|&i| self.clips[i].clone()).collect();
        for &i in indices.iter().rev() {
            self.clips.remove(i);
        }

        let dest = to.min(self.clips.len());
        for (offset, clip) in moved.into_iter().enumerate() {
            self.clips.insert(dest + offset, clip);
        }

        self.touch();
    }

    fn touch(&mut self) {
        let now = Utc::now();
        // Clock adjustments must not break modified_at >= created_at
        self.modified_at = now.max(self.created_at);
    }
}
