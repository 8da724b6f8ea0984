//! Generator settings.

use crate::error::{Result, SitemapError};
use crate::model::{default_static_entries, SiteUrl, StaticEntry, MAX_URLS_PER_SEGMENT};
use std::path::{Component, Path, PathBuf};

/// Environment variable holding the public base URL.
pub const BASE_URL_ENV: &str = "NEXT_PUBLIC_SITE_URL";

/// Older name for [`BASE_URL_ENV`], read when the primary one is unset.
pub const BASE_URL_ENV_ALIAS: &str = "SITE_URL";

/// Base URL used when [`BASE_URL_ENV`] is unset.
pub const DEFAULT_BASE_URL: &str = "http://localhost:3000";

/// Environment variable holding the SQLite database path.
pub const DATABASE_ENV: &str = "BIZDIR_DATABASE";

/// Database path used when [`DATABASE_ENV`] is unset.
pub const DEFAULT_DATABASE: &str = "data/companies.db";

/// Rows fetched per query.
pub const DEFAULT_PAGE_SIZE: usize = 10_000;

/// Largest accepted page size.
pub const MAX_PAGE_SIZE: usize = 1_000_000;

/// Directory the segment files and manifest are written to.
pub const DEFAULT_OUTPUT_DIR: &str = "public/sitemaps";

/// Well-known location crawlers fetch first.
pub const DEFAULT_POINTER_PATH: &str = "public/sitemap.xml";

/// Everything a generation run needs apart from the data source.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    pub base_url: String,
    pub output_dir: PathBuf,
    pub pointer_path: PathBuf,
    /// Rows per page fetch. Bounds memory held from the source.
    pub page_size: usize,
    /// URLs per segment file. Bounds output file size.
    pub segment_capacity: usize,
    /// Path prefix of company pages, e.g. `company`.
    pub company_prefix: String,
    /// Public URL path under which `output_dir` is served.
    pub sitemap_prefix: String,
    pub static_entries: Vec<StaticEntry>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            pointer_path: PathBuf::from(DEFAULT_POINTER_PATH),
            page_size: DEFAULT_PAGE_SIZE,
            segment_capacity: MAX_URLS_PER_SEGMENT,
            company_prefix: "company".to_string(),
            sitemap_prefix: "sitemaps".to_string(),
            static_entries: default_static_entries(),
        }
    }
}

impl GeneratorConfig {
    /// Defaults rooted at `dir`: segments in `dir/sitemaps`, pointer at `dir/sitemap.xml`.
    pub fn rooted_at(dir: &Path) -> Self {
        Self {
            output_dir: dir.join("sitemaps"),
            pointer_path: dir.join("sitemap.xml"),
            ..Self::default()
        }
    }

    /// Reject settings that would produce invalid output.
    pub fn validate(&self) -> Result<()> {
        if self.page_size == 0 || self.page_size > MAX_PAGE_SIZE {
            return Err(SitemapError::Config(format!(
                "page size must be between 1 and {MAX_PAGE_SIZE}, got {}",
                self.page_size
            )));
        }
        if self.segment_capacity == 0 || self.segment_capacity > MAX_URLS_PER_SEGMENT {
            return Err(SitemapError::Config(format!(
                "segment capacity must be between 1 and {MAX_URLS_PER_SEGMENT}, got {}",
                self.segment_capacity
            )));
        }
        if self.static_entries.len() > self.segment_capacity {
            return Err(SitemapError::Config(format!(
                "{} static entries exceed segment capacity {}",
                self.static_entries.len(),
                self.segment_capacity
            )));
        }
        let output_dir = normalize(&self.output_dir)?;
        let pointer = normalize(&self.pointer_path)?;
        if pointer.starts_with(&output_dir) {
            return Err(SitemapError::Config(format!(
                "pointer file {} must live outside the output directory {}",
                self.pointer_path.display(),
                self.output_dir.display()
            )));
        }
        if pointer.file_name().is_none() {
            return Err(SitemapError::Config(format!(
                "pointer path {} does not name a file",
                self.pointer_path.display()
            )));
        }
        self.site()?;
        Ok(())
    }

    /// Parsed base URL with this config's prefixes.
    pub fn site(&self) -> Result<SiteUrl> {
        SiteUrl::parse(&self.base_url, &self.company_prefix, &self.sitemap_prefix)
    }
}

/// Pick the base URL: an explicit value, then `alias`, then the default.
///
/// `explicit` already carries [`BASE_URL_ENV`] when the CLI read it.
pub fn resolve_base_url(explicit: Option<String>, alias: Option<String>) -> String {
    let set = |url: &String| !url.trim().is_empty();
    explicit
        .filter(set)
        .or(alias.filter(set))
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
}

/// Absolute form of `path` with `.` and `..` resolved lexically.
fn normalize(path: &Path) -> Result<PathBuf> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map_err(|e| SitemapError::io(path, e))?
            .join(path)
    };

    let mut out = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::MANIFEST_FILE;

    #[test]
    fn test_defaults_are_valid() {
        let config = GeneratorConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.segment_capacity, 50_000);
        assert_eq!(config.page_size, 10_000);
        assert_eq!(config.static_entries.len(), 7);
    }

    #[test]
    fn test_rejects_bad_capacity() {
        let mut config = GeneratorConfig::default();
        config.segment_capacity = 50_001;
        assert!(config.validate().is_err());
        config.segment_capacity = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_zero_page_size() {
        let config = GeneratorConfig {
            page_size: 0,
            ..GeneratorConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_pointer_inside_output_dir() {
        let config = GeneratorConfig {
            pointer_path: PathBuf::from("public/sitemaps/sitemap.xml"),
            ..GeneratorConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_oversized_page_size() {
        let config = GeneratorConfig {
            page_size: usize::MAX,
            ..GeneratorConfig::default()
        };
        assert!(matches!(config.validate(), Err(SitemapError::Config(_))));

        let config = GeneratorConfig {
            page_size: MAX_PAGE_SIZE,
            ..GeneratorConfig::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_pointer_reaching_output_dir_indirectly() {
        for pointer in [
            format!("./public/sitemaps/{MANIFEST_FILE}"),
            "public/other/../sitemaps/sitemap.xml".to_string(),
            "public/sitemaps/nested/sitemap.xml".to_string(),
            "public/sitemaps".to_string(),
        ] {
            let config = GeneratorConfig {
                pointer_path: PathBuf::from(&pointer),
                ..GeneratorConfig::default()
            };
            assert!(config.validate().is_err(), "pointer={pointer}");
        }

        let config = GeneratorConfig {
            pointer_path: PathBuf::from("./public/../public/sitemap.xml"),
            ..GeneratorConfig::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_resolve_base_url() {
        assert_eq!(
            resolve_base_url(Some("https://a.example".into()), Some("https://b.example".into())),
            "https://a.example"
        );
        assert_eq!(
            resolve_base_url(None, Some("https://b.example".into())),
            "https://b.example"
        );
        assert_eq!(resolve_base_url(None, None), DEFAULT_BASE_URL);
        assert_eq!(resolve_base_url(Some(" ".into()), None), DEFAULT_BASE_URL);
        assert_eq!(
            resolve_base_url(Some("".into()), Some("https://b.example".into())),
            "https://b.example"
        );
    }

    #[test]
    fn test_rooted_at() {
        let config = GeneratorConfig::rooted_at(Path::new("/srv/site"));
        assert_eq!(config.output_dir, PathBuf::from("/srv/site/sitemaps"));
        assert_eq!(config.pointer_path, PathBuf::from("/srv/site/sitemap.xml"));
        assert!(config.validate().is_ok());
    }
}
