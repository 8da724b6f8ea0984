//! Output directory preparation.

use crate::error::{Result, SitemapError};
use std::path::Path;
use tracing::{debug, info};

/// Ensure `dir` exists and holds no files from a previous run.
///
/// Missing directories are created with their parents. Files directly inside
/// `dir` are deleted; subdirectories are left alone. Returns how many files
/// were removed.
pub async fn prepare_output_dir(dir: &Path) -> Result<usize> {
    if !tokio::fs::try_exists(dir)
        .await
        .map_err(|e| SitemapError::io(dir, e))?
    {
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| SitemapError::io(dir, e))?;
        info!(dir = %dir.display(), "created output directory");
        return Ok(0);
    }

    let mut entries = tokio::fs::read_dir(dir)
        .await
        .map_err(|e| SitemapError::io(dir, e))?;
    let mut removed = 0;

    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| SitemapError::io(dir, e))?
    {
        let path = entry.path();
        let file_type = entry
            .file_type()
            .await
            .map_err(|e| SitemapError::io(&path, e))?;
        if file_type.is_dir() {
            continue;
        }
        tokio::fs::remove_file(&path)
            .await
            .map_err(|e| SitemapError::io(&path, e))?;
        debug!(file = %path.display(), "removed stale file");
        removed += 1;
    }

    info!(dir = %dir.display(), removed, "output directory cleaned");
    Ok(removed)
}
