//! `bizdir-sitemap preview`: one capped sitemap of the newest companies.

use crate::cli::generate_cmd;
use crate::cli::output::{self, Styled};
use crate::config::GeneratorConfig;
use crate::preview;
use crate::source::{SqliteSource, TableSpec};
use anyhow::{Context, Result};
use chrono::Utc;
use std::io::Write;
use std::path::Path;

/// Run the preview command, writing to `out` or stdout.
pub async fn run(
    config: &GeneratorConfig,
    database: &Path,
    table: TableSpec,
    limit: usize,
    out: Option<&Path>,
) -> Result<()> {
    let s = Styled::new();
    let mut source = SqliteSource::open(database, table)
        .with_context(|| format!("failed to open company database {}", database.display()))?;

    let result = preview::render_preview(config, &mut source, limit, Utc::now()).await;
    let preview = generate_cmd::settle(result, source.close(), "preview failed")?;

    match out {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
            std::fs::write(path, &preview.body)
                .with_context(|| format!("failed to write {}", path.display()))?;

            if output::is_json() {
                output::print_json(&serde_json::json!({
                    "file": path.display().to_string(),
                    "urls": preview.records.len(),
                }));
            } else if !output::is_quiet() {
                eprintln!(
                    "  {} Wrote {} URLs to {}",
                    s.ok_sym(),
                    output::format_count(preview.records.len() as u64),
                    path.display()
                );
            }
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(&preview.body)?;
            stdout.flush()?;
        }
    }
    Ok(())
}
