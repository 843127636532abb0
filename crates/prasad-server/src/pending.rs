use std::path::{Path, PathBuf};

use tracing::{debug, warn};

/// A file being written whose record does not exist yet.
///
/// Dropping the guard removes the file; [`PendingFile::commit`] keeps it.
/// Removal happens on every early return, so a failed insert never leaves
/// an orphan behind.
#[derive(Debug)]
pub struct PendingFile {
    path: Option<PathBuf>,
}

impl PendingFile {
    pub fn new(path: PathBuf) -> Self {
        Self { path: Some(path) }
    }

    pub fn path(&self) -> &Path {
        self.path.as_deref().unwrap_or_else(|| Path::new(""))
    }

    /// The record now references the file; keep it on disk.
    pub fn commit(mut self) -> PathBuf {
        self.path.take().unwrap_or_default()
    }
}

impl Drop for PendingFile {
    fn drop(&mut self) {
        let Some(path) = self.path.take() else {
            return;
        };
        match std::fs::remove_file(&path) {
            Ok(()) => debug!(path = %path.display(), "Removed uncommitted upload"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(
                path = %path.display(),
                error = %e,
                "Failed to remove uncommitted upload"
            ),
        }
    }
}
