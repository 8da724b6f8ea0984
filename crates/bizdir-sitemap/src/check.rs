//! Read back a generated sitemap set and verify its structure.
//!
//! Starts from the pointer, follows it to the manifest, then parses every
//! listed segment. Problems are collected rather than returned as errors so a
//! single pass reports everything wrong with a directory.

use crate::config::GeneratorConfig;
use crate::error::{Result, SitemapError};
use crate::model::{parse_company_segment_name, SiteUrl, MANIFEST_FILE, STATIC_SEGMENT};
use crate::xml::{self, DocumentKind};
use serde::Serialize;
use std::path::Path;
use tracing::warn;

/// URL count of one segment file.
#[derive(Debug, Clone, Serialize)]
pub struct SegmentCount {
    pub filename: String,
    pub urls: usize,
}

/// Result of checking a sitemap set.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CheckReport {
    pub segments: Vec<SegmentCount>,
    pub total_urls: usize,
    pub problems: Vec<String>,
}

impl CheckReport {
    pub fn is_ok(&self) -> bool {
        self.problems.is_empty()
    }

    fn problem(&mut self, msg: String) {
        warn!("{msg}");
        self.problems.push(msg);
    }
}

/// Verify the set described by `config`.
///
/// Unreadable or unparseable pointer/manifest files are errors; everything
/// found wrong past that point is recorded in the report.
pub async fn check(config: &GeneratorConfig) -> Result<CheckReport> {
    let site = config.site()?;
    let mut report = CheckReport::default();

    let pointer = read_document(&config.pointer_path).await?;
    if pointer.kind != DocumentKind::SitemapIndex || pointer.locs.len() != 1 {
        report.problem(format!(
            "pointer {} should be a sitemap index with exactly one entry, found {} entries",
            config.pointer_path.display(),
            pointer.locs.len()
        ));
    }
    let expected_manifest = site.sitemap_file_url(MANIFEST_FILE);
    if pointer.locs.first() != Some(&expected_manifest) {
        report.problem(format!(
            "pointer should reference {expected_manifest}, found {:?}",
            pointer.locs.first()
        ));
    }

    let manifest = read_document(&config.output_dir.join(MANIFEST_FILE)).await?;
    if manifest.kind != DocumentKind::SitemapIndex {
        report.problem(format!("{MANIFEST_FILE} is not a sitemap index"));
    }

    let filenames = manifest_filenames(&site, &manifest.locs, &mut report);
    check_order(&filenames, &mut report);

    for name in &filenames {
        let path = config.output_dir.join(name);
        match read_document(&path).await {
            Ok(doc) if doc.kind == DocumentKind::UrlSet => {
                report.total_urls += doc.locs.len();
                report.segments.push(SegmentCount {
                    filename: name.clone(),
                    urls: doc.locs.len(),
                });
            }
            Ok(_) => report.problem(format!("{name} is not a <urlset> document")),
            Err(e) => report.problem(format!("{name}: {e}")),
        }
    }

    check_capacity(config.segment_capacity, &mut report);
    Ok(report)
}

async fn read_document(path: &Path) -> Result<xml::ParsedDocument> {
    let body = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| SitemapError::io(path, e))?;
    xml::parse_locs(&body)
}

fn manifest_filenames(site: &SiteUrl, locs: &[String], report: &mut CheckReport) -> Vec<String> {
    let mut names = Vec::with_capacity(locs.len());
    for loc in locs {
        match site.sitemap_filename(loc) {
            Some(name) => names.push(name),
            None => report.problem(format!("manifest entry outside the sitemap path: {loc}")),
        }
    }
    names
}

/// Static segment first, then numbered segments 1..=n without gaps.
fn check_order(names: &[String], report: &mut CheckReport) {
    match names.first() {
        Some(first) if first == STATIC_SEGMENT => {}
        other => report.problem(format!(
            "manifest should start with {STATIC_SEGMENT}, found {other:?}"
        )),
    }

    for (i, name) in names.iter().skip(1).enumerate() {
        match parse_company_segment_name(name) {
            Some(n) if n == i + 1 => {}
            Some(_) => report.problem(format!(
                "{name} listed where segment-companies-{}.xml was expected",
                i + 1
            )),
            None => report.problem(format!("unexpected manifest entry {name}")),
        }
    }
}

/// Every numbered segment but the last must be exactly full; none may overflow.
fn check_capacity(capacity: usize, report: &mut CheckReport) {
    let numbered: Vec<(String, usize)> = report
        .segments
        .iter()
        .filter(|s| parse_company_segment_name(&s.filename).is_some())
        .map(|s| (s.filename.clone(), s.urls))
        .collect();

    for (i, (name, urls)) in numbered.iter().enumerate() {
        let is_last = i + 1 == numbered.len();
        if *urls > capacity {
            report.problem(format!("{name} holds {urls} URLs, above capacity {capacity}"));
        } else if !is_last && *urls != capacity {
            report.problem(format!("{name} holds {urls} URLs but is not the last segment"));
        } else if *urls == 0 {
            report.problem(format!("{name} is empty"));
        }
    }

    if let Some(s) = report.segments.iter().find(|s| s.filename == STATIC_SEGMENT) {
        if s.urls > capacity {
            let msg = format!("{STATIC_SEGMENT} holds {} URLs, above capacity {capacity}", s.urls);
            report.problem(msg);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exporter::NoProgress;
    use crate::pipeline::generate;
    use crate::source::testing::MemorySource;

    async fn generated(rows: usize) -> (tempfile::TempDir, GeneratorConfig) {
        let tmp = tempfile::tempdir().unwrap();
        let config = GeneratorConfig {
            page_size: 4,
            segment_capacity: 10,
            ..GeneratorConfig::rooted_at(tmp.path())
        };
        generate(&config, &mut MemorySource::with_rows(rows), &NoProgress)
            .await
            .unwrap();
        (tmp, config)
    }

    #[tokio::test]
    async fn test_generated_set_passes() {
        let (_tmp, config) = generated(27).await;
        let report = check(&config).await.unwrap();
        assert!(report.is_ok(), "{:?}", report.problems);
        assert_eq!(report.segments.len(), 4);
        assert_eq!(report.total_urls, 27 + 7);
    }

    #[tokio::test]
    async fn test_missing_segment_reported() {
        let (_tmp, config) = generated(27).await;
        std::fs::remove_file(config.output_dir.join("segment-companies-2.xml")).unwrap();

        let report = check(&config).await.unwrap();
        assert!(!report.is_ok());
        assert!(report.problems.iter().any(|p| p.contains("segment-companies-2.xml")));
    }

    #[tokio::test]
    async fn test_short_middle_segment_reported() {
        let (_tmp, config) = generated(27).await;
        let site = config.site().unwrap();
        let short: Vec<_> = (0..3)
            .map(|i| crate::model::UrlRecord {
                loc: site.company_url(&i.to_string()),
                lastmod: None,
                changefreq: None,
                priority: None,
            })
            .collect();
        std::fs::write(
            config.output_dir.join("segment-companies-1.xml"),
            xml::render_urlset(&short).unwrap(),
        )
        .unwrap();

        let report = check(&config).await.unwrap();
        assert!(report
            .problems
            .iter()
            .any(|p| p.contains("segment-companies-1.xml") && p.contains("not the last")));
    }

    #[tokio::test]
    async fn test_missing_manifest_is_error() {
        let (_tmp, config) = generated(5).await;
        std::fs::remove_file(config.output_dir.join(MANIFEST_FILE)).unwrap();
        assert!(check(&config).await.unwrap_err().is_io());
    }

    #[test]
    fn test_order_gap_detected() {
        let mut report = CheckReport::default();
        let names: Vec<String> = [
            STATIC_SEGMENT,
            "segment-companies-1.xml",
            "segment-companies-3.xml",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        check_order(&names, &mut report);
        assert_eq!(report.problems.len(), 1);
    }
}
