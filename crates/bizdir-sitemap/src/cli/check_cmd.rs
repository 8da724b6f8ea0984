//! `bizdir-sitemap check`: verify a generated sitemap set on disk.

use crate::check;
use crate::cli::output::{self, Styled};
use crate::config::GeneratorConfig;
use anyhow::{bail, Result};

/// Run the check command. Fails when any problem is found.
pub async fn run(config: &GeneratorConfig) -> Result<()> {
    let s = Styled::new();
    let report = check::check(config).await?;

    if output::is_json() {
        output::print_json(&serde_json::json!({
            "ok": report.is_ok(),
            "segments": report.segments,
            "total_urls": report.total_urls,
            "problems": report.problems,
        }));
    } else if !output::is_quiet() {
        for seg in &report.segments {
            eprintln!(
                "  {:<30} {:>8} URLs",
                seg.filename,
                output::format_count(seg.urls as u64)
            );
        }
        eprintln!();
        eprintln!(
            "  {} files, {} URLs",
            report.segments.len(),
            output::format_count(report.total_urls as u64)
        );

        if report.is_ok() {
            eprintln!("  {} {}", s.ok_sym(), s.green("sitemap set is consistent"));
        } else {
            for problem in &report.problems {
                eprintln!("  {} {}", s.fail_sym(), problem);
            }
        }
    }

    if !report.is_ok() {
        bail!(
            "{} problem(s) found in {}",
            report.problems.len(),
            config.output_dir.display()
        );
    }
    Ok(())
}
