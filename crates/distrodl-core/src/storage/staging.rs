//! Sequential writer for `<destination>.part`.

use anyhow::{Context, Result};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use super::temp_path;

/// Open staging file for one transfer attempt. Dropping it without calling
/// `finalize` leaves the partial file on disk for a later resume.
pub struct StagingFile {
    file: File,
    temp_path: PathBuf,
    final_path: PathBuf,
    len: u64,
}

impl StagingFile {
    /// Create (or truncate) the staging file for `final_path`.
    pub fn create(final_path: &Path) -> Result<Self> {
        let temp_path = temp_path(final_path);
        let file = File::options()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&temp_path)
            .with_context(|| format!("failed to create staging file: {}", temp_path.display()))?;
        Ok(StagingFile {
            file,
            temp_path,
            final_path: final_path.to_path_buf(),
            len: 0,
        })
    }

    /// Open the existing staging file for `final_path` in append mode (created if missing).
    pub fn append(final_path: &Path) -> Result<Self> {
        let temp_path = temp_path(final_path);
        let file = File::options()
            .append(true)
            .create(true)
            .open(&temp_path)
            .with_context(|| format!("failed to open staging file: {}", temp_path.display()))?;
        let len = file
            .metadata()
            .with_context(|| format!("failed to stat staging file: {}", temp_path.display()))?
            .len();
        Ok(StagingFile {
            file,
            temp_path,
            final_path: final_path.to_path_buf(),
            len,
        })
    }

    pub fn write_chunk(&mut self, data: &[u8]) -> Result<()> {
        self.file
            .write_all(data)
            .with_context(|| format!("write to {} failed", self.temp_path.display()))?;
        self.len += data.len() as u64;
        Ok(())
    }

    /// Bytes currently in the staging file.
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn temp_path(&self) -> &Path {
        &self.temp_path
    }

    /// Sync, close, remove any existing destination, and rename the staging
    /// file into place. Fails if the destination is on a different filesystem.
    pub fn finalize(self) -> Result<PathBuf> {
        self.file
            .sync_all()
            .with_context(|| format!("sync {} failed", self.temp_path.display()))?;
        drop(self.file);

        if self.final_path.exists() {
            std::fs::remove_file(&self.final_path).with_context(|| {
                format!("failed to remove existing {}", self.final_path.display())
            })?;
        }
        std::fs::rename(&self.temp_path, &self.final_path).with_context(|| {
            format!(
                "failed to rename {} to {}",
                self.temp_path.display(),
                self.final_path.display()
            )
        })?;
        Ok(self.final_path)
    }
}
