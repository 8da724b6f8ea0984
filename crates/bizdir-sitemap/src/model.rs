//! Records flowing through the generator: source rows, URL entries, static pages.

use crate::error::{Result, SitemapError};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

/// Maximum number of URLs a single sitemap file may hold.
pub const MAX_URLS_PER_SEGMENT: usize = 50_000;

/// Filename of the segment holding the fixed static pages.
pub const STATIC_SEGMENT: &str = "segment-static.xml";

/// Filename of the manifest listing every segment.
pub const MANIFEST_FILE: &str = "sitemap-index.xml";

/// Priority for companies whose status is active.
pub const ACTIVE_PRIORITY: f32 = 0.8;

/// Priority for every other company.
pub const DEFAULT_PRIORITY: f32 = 0.5;

/// Filename for the numbered company segment `index` (1-based).
pub fn company_segment_name(index: usize) -> String {
    format!("segment-companies-{index}.xml")
}

/// Parse a numbered company segment filename back to its index.
pub fn parse_company_segment_name(name: &str) -> Option<usize> {
    name.strip_prefix("segment-companies-")?
        .strip_suffix(".xml")?
        .parse()
        .ok()
}

/// Format a timestamp the way every `<lastmod>` is written.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// How often a page is expected to change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeFreq {
    Always,
    Hourly,
    Daily,
    Weekly,
    Monthly,
    Yearly,
    Never,
}

impl ChangeFreq {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Always => "always",
            Self::Hourly => "hourly",
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Yearly => "yearly",
            Self::Never => "never",
        }
    }
}

impl fmt::Display for ChangeFreq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of the companies table, as read from the data source.
#[derive(Debug, Clone, PartialEq)]
pub struct CompanyRow {
    pub id: i64,
    pub slug: Option<String>,
    pub registered_at: Option<DateTime<Utc>>,
    pub status: Option<String>,
}

impl CompanyRow {
    /// True when the status equals "active", ignoring case.
    pub fn is_active(&self) -> bool {
        self.status
            .as_deref()
            .is_some_and(|s| s.eq_ignore_ascii_case("active"))
    }

    /// The path segment identifying this company: slug if non-empty, else id.
    pub fn path_key(&self) -> String {
        match self.slug.as_deref() {
            Some(slug) if !slug.is_empty() => slug.to_string(),
            _ => self.id.to_string(),
        }
    }
}

/// A single `<url>` entry of a segment file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UrlRecord {
    pub loc: String,
    pub lastmod: Option<DateTime<Utc>>,
    pub changefreq: Option<ChangeFreq>,
    pub priority: Option<f32>,
}

impl UrlRecord {
    /// Build the entry for a company page.
    ///
    /// `now` stands in for rows without a registration date.
    pub fn from_company(row: &CompanyRow, site: &SiteUrl, now: DateTime<Utc>) -> Self {
        let priority = if row.is_active() {
            ACTIVE_PRIORITY
        } else {
            DEFAULT_PRIORITY
        };

        Self {
            loc: site.company_url(&row.path_key()),
            lastmod: Some(row.registered_at.unwrap_or(now)),
            changefreq: Some(ChangeFreq::Monthly),
            priority: Some(priority),
        }
    }
}

/// A hand-curated page that is not backed by a table row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaticEntry {
    /// Path relative to the site root; empty for the home page.
    pub path: String,
    pub changefreq: ChangeFreq,
    pub priority: f32,
}

impl StaticEntry {
    pub fn new(path: &str, changefreq: ChangeFreq, priority: f32) -> Self {
        Self {
            path: path.to_string(),
            changefreq,
            priority,
        }
    }

    pub fn to_record(&self, site: &SiteUrl) -> UrlRecord {
        UrlRecord {
            loc: site.page_url(&self.path),
            lastmod: None,
            changefreq: Some(self.changefreq),
            priority: Some(self.priority),
        }
    }
}

/// The informational pages of the directory, in the order they are listed.
pub fn default_static_entries() -> Vec<StaticEntry> {
    vec![
        StaticEntry::new("", ChangeFreq::Daily, 1.0),
        StaticEntry::new("about", ChangeFreq::Weekly, 0.8),
        StaticEntry::new("contact", ChangeFreq::Weekly, 0.8),
        StaticEntry::new("privacy-policy", ChangeFreq::Monthly, 0.5),
        StaticEntry::new("terms-of-service", ChangeFreq::Monthly, 0.5),
        StaticEntry::new("faq", ChangeFreq::Weekly, 0.7),
        StaticEntry::new("help-center", ChangeFreq::Weekly, 0.7),
    ]
}

/// Base URL of the public site plus the path prefixes used to build locations.
#[derive(Debug, Clone)]
pub struct SiteUrl {
    base: Url,
    company_prefix: String,
    sitemap_prefix: String,
}

impl SiteUrl {
    /// Parse a base URL. Only http and https are accepted.
    pub fn parse(base: &str, company_prefix: &str, sitemap_prefix: &str) -> Result<Self> {
        let base = Url::parse(base)
            .map_err(|e| SitemapError::Config(format!("invalid base URL '{base}': {e}")))?;
        if !matches!(base.scheme(), "http" | "https") || base.cannot_be_a_base() {
            return Err(SitemapError::Config(format!(
                "base URL must be http or https: {base}"
            )));
        }
        Ok(Self {
            base,
            company_prefix: company_prefix.trim_matches('/').to_string(),
            sitemap_prefix: sitemap_prefix.trim_matches('/').to_string(),
        })
    }

    /// The site root, e.g. `https://example.com/`.
    pub fn root(&self) -> &Url {
        &self.base
    }

    /// Absolute URL of a company page. The key is percent-encoded as a single segment.
    pub fn company_url(&self, key: &str) -> String {
        self.join(&[self.company_prefix.as_str(), key])
    }

    /// Absolute URL of a static page given its slash-separated path.
    pub fn page_url(&self, path: &str) -> String {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        self.join(&segments)
    }

    /// Public URL of a file in the sitemap output directory.
    pub fn sitemap_file_url(&self, filename: &str) -> String {
        self.join(&[self.sitemap_prefix.as_str(), filename])
    }

    /// Map a public sitemap URL back to its filename, if it lives under the sitemap prefix.
    pub fn sitemap_filename(&self, loc: &str) -> Option<String> {
        let mut prefix = self.sitemap_file_url("");
        if !prefix.ends_with('/') {
            prefix.push('/');
        }
        loc.strip_prefix(prefix.as_str())
            .filter(|name| !name.is_empty() && !name.contains('/'))
            .map(String::from)
    }

    fn join(&self, segments: &[&str]) -> String {
        let mut url = self.base.clone();
        url.set_query(None);
        url.set_fragment(None);
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty();
            for segment in segments.iter().filter(|s| !s.is_empty()) {
                path.push(segment);
            }
        }
        url.to_string()
    }
}
