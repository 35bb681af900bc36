//! Async handle on a single file.

use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Thin handle on one file, identified by its path.
///
/// Owns no OS resources; every operation opens the file anew through
/// `tokio::fs`. Writes replace the whole file - there is no append and no
/// atomic-rename step, so atomicity is whatever the filesystem gives a
/// single write call.
#[derive(Clone, Debug)]
pub struct FileHandle {
    path: PathBuf,
}

impl FileHandle {
    /// Create a handle for `path`. The file need not exist yet.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The path this handle points at.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the file currently exists.
    pub async fn exists(&self) -> bool {
        tokio::fs::try_exists(&self.path).await.unwrap_or(false)
    }

    /// Read the full file as UTF-8 text.
    pub async fn read_text(&self) -> io::Result<String> {
        log::debug!("Reading {}...", self.path.display());
        tokio::fs::read_to_string(&self.path).await
    }

    /// Write `text`, replacing any prior content in full.
    pub async fn write_text(&self, text: &str) -> io::Result<()> {
        log::debug!("Writing {}...", self.path.display());
        tokio::fs::write(&self.path, text).await
    }

    /// The file's last-modification time, or `None` when it does not exist.
    pub async fn modified(&self) -> io::Result<Option<SystemTime>> {
        match tokio::fs::metadata(&self.path).await {
            Ok(metadata) => metadata.modified().map(Some),
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(error) => Err(error),
        }
    }
}
