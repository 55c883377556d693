//! Staging file lifecycle.
//!
//! Bytes accumulate in `<destination>.part`; its size is the resume offset.
//! On success the staging file is renamed over the destination.

mod staging;

pub use staging::StagingFile;

use std::path::{Path, PathBuf};

/// Temporary file suffix used before atomic rename.
pub const TEMP_SUFFIX: &str = ".part";

/// Path for the staging file: appends `.part` to the final path (e.g. `file.iso` → `file.iso.part`).
pub fn temp_path(final_path: &Path) -> PathBuf {
    let mut o = final_path.as_os_str().to_owned();
    o.push(TEMP_SUFFIX);
    PathBuf::from(o)
}

/// Size of an existing staging file for `final_path`, or 0 if there is none.
pub fn resume_offset(final_path: &Path) -> u64 {
    std::fs::metadata(temp_path(final_path))
        .map(|m| if m.is_file() { m.len() } else { 0 })
        .unwrap_or(0)
}

/// Delete the staging file for `final_path`. Returns true if a file was removed.
pub fn discard_partial(final_path: &Path) -> std::io::Result<bool> {
    let tp = temp_path(final_path);
    match std::fs::remove_file(&tp) {
        Ok(()) => {
            tracing::info!(path = %tp.display(), "removed partial download");
            Ok(true)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}
