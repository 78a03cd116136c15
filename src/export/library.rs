use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::LibraryError;

/// External media library exported videos can be saved into
///
/// Stands in for a platform media store: importing copies the artifact under
/// the library root, leaving the original export in place.
pub struct MediaLibrary {
    root: PathBuf,
}

impl MediaLibrary {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    /// Copy an exported artifact into the library, returning its new path
    pub fn import(&self, artifact: &Path) -> Result<PathBuf, LibraryError> {
        let name = artifact.file_name().ok_or_else(|| LibraryError::SaveFailed {
            reason: format!("artifact has no file name: {}", artifact.display()),
        })?;

        std::fs::create_dir_all(&self.root).map_err(|e| LibraryError::SaveFailed {
            reason: format!("cannot create library directory: {e}"),
        })?;

        let destination = self.root.join(name);
        std::fs::copy(artifact, &destination).map_err(|e| LibraryError::SaveFailed {
            reason: format!("cannot copy into library: {e}"),
        })?;

        info!("Saved {:?} into library at {:?}", artifact, destination);
        Ok(destination)
    }
}
