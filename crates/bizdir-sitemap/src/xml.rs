//! Sitemap protocol documents: `<urlset>` segments and `<sitemapindex>` indexes.
//!
//! Writing goes through `quick_xml::Writer` so every location is escaped.
//! Reading is a small event loop that only collects `<loc>` values, enough to
//! verify a generated set.

use crate::error::{Result, SitemapError};
use crate::model::{format_timestamp, UrlRecord};
use chrono::{DateTime, Utc};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

/// Namespace of the sitemap protocol.
pub const SITEMAP_NS: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";

/// One `<sitemap>` entry of an index document.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexEntry {
    pub loc: String,
    pub lastmod: Option<DateTime<Utc>>,
}

/// Root element of a parsed document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    UrlSet,
    SitemapIndex,
}

/// Locations found in a parsed document, in document order.
#[derive(Debug, Clone)]
pub struct ParsedDocument {
    pub kind: DocumentKind,
    pub locs: Vec<String>,
}

/// Render a `<urlset>` holding `records`. Absent optional fields are omitted.
pub fn render_urlset(records: &[UrlRecord]) -> Result<Vec<u8>> {
    let mut w = new_writer()?;
    let mut root = BytesStart::new("urlset");
    root.push_attribute(("xmlns", SITEMAP_NS));
    w.write_event(Event::Start(root)).map_err(SitemapError::xml)?;

    for record in records {
        w.write_event(Event::Start(BytesStart::new("url")))
            .map_err(SitemapError::xml)?;
        text_element(&mut w, "loc", &record.loc)?;
        if let Some(ts) = &record.lastmod {
            text_element(&mut w, "lastmod", &format_timestamp(ts))?;
        }
        if let Some(freq) = record.changefreq {
            text_element(&mut w, "changefreq", freq.as_str())?;
        }
        if let Some(priority) = record.priority {
            text_element(&mut w, "priority", &format!("{priority:.1}"))?;
        }
        w.write_event(Event::End(BytesEnd::new("url")))
            .map_err(SitemapError::xml)?;
    }

    w.write_event(Event::End(BytesEnd::new("urlset")))
        .map_err(SitemapError::xml)?;
    Ok(finish(w))
}

/// Render a `<sitemapindex>` listing `entries`.
pub fn render_sitemap_index(entries: &[IndexEntry]) -> Result<Vec<u8>> {
    let mut w = new_writer()?;
    let mut root = BytesStart::new("sitemapindex");
    root.push_attribute(("xmlns", SITEMAP_NS));
    w.write_event(Event::Start(root)).map_err(SitemapError::xml)?;

    for entry in entries {
        w.write_event(Event::Start(BytesStart::new("sitemap")))
            .map_err(SitemapError::xml)?;
        text_element(&mut w, "loc", &entry.loc)?;
        if let Some(ts) = &entry.lastmod {
            text_element(&mut w, "lastmod", &format_timestamp(ts))?;
        }
        w.write_event(Event::End(BytesEnd::new("sitemap")))
            .map_err(SitemapError::xml)?;
    }

    w.write_event(Event::End(BytesEnd::new("sitemapindex")))
        .map_err(SitemapError::xml)?;
    Ok(finish(w))
}

/// Parse a `<urlset>` or `<sitemapindex>` document and collect its locations.
pub fn parse_locs(xml: &str) -> Result<ParsedDocument> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();

    let mut kind = None;
    let mut in_loc = false;
    let mut locs = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => match e.local_name().as_ref() {
                b"urlset" if kind.is_none() => kind = Some(DocumentKind::UrlSet),
                b"sitemapindex" if kind.is_none() => kind = Some(DocumentKind::SitemapIndex),
                b"loc" => in_loc = true,
                _ => {}
            },
            Ok(Event::Text(ref e)) if in_loc => {
                let text = e.unescape().map_err(SitemapError::xml)?;
                locs.push(text.trim().to_string());
            }
            Ok(Event::End(ref e)) => {
                if e.local_name().as_ref() == b"loc" {
                    in_loc = false;
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(SitemapError::Xml(format!(
                    "malformed document at byte {}: {e}",
                    reader.buffer_position()
                )))
            }
            _ => {}
        }
        buf.clear();
    }

    let kind = kind.ok_or_else(|| SitemapError::Xml("no <urlset> or <sitemapindex> root".into()))?;
    Ok(ParsedDocument { kind, locs })
}

fn new_writer() -> Result<Writer<Vec<u8>>> {
    let mut w = Writer::new_with_indent(Vec::new(), b' ', 2);
    w.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(SitemapError::xml)?;
    Ok(w)
}

fn text_element(w: &mut Writer<Vec<u8>>, name: &str, value: &str) -> Result<()> {
    w.write_event(Event::Start(BytesStart::new(name)))
        .map_err(SitemapError::xml)?;
    w.write_event(Event::Text(BytesText::new(value)))
        .map_err(SitemapError::xml)?;
    w.write_event(Event::End(BytesEnd::new(name)))
        .map_err(SitemapError::xml)?;
    Ok(())
}

fn finish(w: Writer<Vec<u8>>) -> Vec<u8> {
    let mut out = w.into_inner();
    out.push(b'\n');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ChangeFreq;
    use chrono::TimeZone;

    fn record(loc: &str) -> UrlRecord {
        UrlRecord {
            loc: loc.to_string(),
            lastmod: None,
            changefreq: None,
            priority: None,
        }
    }

    #[test]
    fn test_urlset_omits_absent_fields() {
        let body = render_urlset(&[record("https://example.com/")]).unwrap();
        let xml = String::from_utf8(body).unwrap();
        assert!(xml.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?>"#));
        assert!(xml.contains(r#"<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">"#));
        assert!(xml.contains("<loc>https://example.com/</loc>"));
        assert!(!xml.contains("lastmod"));
        assert!(!xml.contains("changefreq"));
        assert!(!xml.contains("priority"));
    }

    #[test]
    fn test_urlset_full_entry() {
        let ts = Utc.with_ymd_and_hms(2020, 2, 3, 4, 5, 6).unwrap();
        let rec = UrlRecord {
            loc: "https://example.com/company/acme".into(),
            lastmod: Some(ts),
            changefreq: Some(ChangeFreq::Monthly),
            priority: Some(0.8),
        };
        let xml = String::from_utf8(render_urlset(&[rec]).unwrap()).unwrap();
        assert!(xml.contains("<lastmod>2020-02-03T04:05:06.000Z</lastmod>"));
        assert!(xml.contains("<changefreq>monthly</changefreq>"));
        assert!(xml.contains("<priority>0.8</priority>"));
    }

    #[test]
    fn test_locations_are_escaped() {
        let body = render_urlset(&[record("https://example.com/?a=1&b=2")]).unwrap();
        let xml = String::from_utf8(body).unwrap();
        assert!(xml.contains("a=1&amp;b=2"));

        let parsed = parse_locs(&xml).unwrap();
        assert_eq!(parsed.kind, DocumentKind::UrlSet);
        assert_eq!(parsed.locs, vec!["https://example.com/?a=1&b=2"]);
    }

    #[test]
    fn test_index_lists_entries_in_order() {
        let ts = Utc.with_ymd_and_hms(2026, 10, 16, 0, 0, 0).unwrap();
        let entries: Vec<IndexEntry> = ["a.xml", "b.xml"]
            .iter()
            .map(|f| IndexEntry {
                loc: format!("https://example.com/sitemaps/{f}"),
                lastmod: Some(ts),
            })
            .collect();
        let xml = String::from_utf8(render_sitemap_index(&entries).unwrap()).unwrap();
        assert_eq!(xml.matches("<lastmod>2026-10-16T00:00:00.000Z</lastmod>").count(), 2);

        let parsed = parse_locs(&xml).unwrap();
        assert_eq!(parsed.kind, DocumentKind::SitemapIndex);
        assert_eq!(
            parsed.locs,
            vec![
                "https://example.com/sitemaps/a.xml",
                "https://example.com/sitemaps/b.xml"
            ]
        );
    }

    #[test]
    fn test_parse_rejects_unknown_root() {
        assert!(parse_locs("<rss><channel/></rss>").is_err());
    }

    #[test]
    fn test_empty_urlset_parses() {
        let xml = String::from_utf8(render_urlset(&[]).unwrap()).unwrap();
        let parsed = parse_locs(&xml).unwrap();
        assert!(parsed.locs.is_empty());
    }
}
