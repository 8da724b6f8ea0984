//! Manifest and pointer files.

use crate::error::{Result, SitemapError};
use crate::model::{SiteUrl, MANIFEST_FILE};
use crate::xml::{self, IndexEntry};
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use tracing::info;

/// Paths of the files written by [`write_index`].
#[derive(Debug, Clone)]
pub struct IndexFiles {
    pub manifest: PathBuf,
    pub pointer: PathBuf,
}

/// Write the manifest listing `segments` (in the given order) into
/// `output_dir`, then overwrite the pointer at `pointer_path` so it references
/// the manifest. Every entry shares `generated_at` as its `<lastmod>`.
pub async fn write_index(
    output_dir: &Path,
    pointer_path: &Path,
    segments: &[String],
    site: &SiteUrl,
    generated_at: DateTime<Utc>,
) -> Result<IndexFiles> {
    let entries: Vec<IndexEntry> = segments
        .iter()
        .map(|file| IndexEntry {
            loc: site.sitemap_file_url(file),
            lastmod: Some(generated_at),
        })
        .collect();

    let manifest = output_dir.join(MANIFEST_FILE);
    write_file(&manifest, xml::render_sitemap_index(&entries)?).await?;
    info!(file = %manifest.display(), entries = entries.len(), "wrote manifest");

    let pointer_entry = IndexEntry {
        loc: site.sitemap_file_url(MANIFEST_FILE),
        lastmod: Some(generated_at),
    };
    if let Some(parent) = pointer_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| SitemapError::io(parent, e))?;
    }
    write_file(pointer_path, xml::render_sitemap_index(&[pointer_entry])?).await?;
    info!(file = %pointer_path.display(), "wrote index pointer");

    Ok(IndexFiles {
        manifest,
        pointer: pointer_path.to_path_buf(),
    })
}

async fn write_file(path: &Path, body: Vec<u8>) -> Result<()> {
    tokio::fs::write(path, body)
        .await
        .map_err(|e| SitemapError::io(path, e))
}
