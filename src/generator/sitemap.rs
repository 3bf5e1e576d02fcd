//! Sitemap generation.
//!
//! ```xml
//! <?xml version="1.0" encoding="UTF-8"?>
//! <urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
//!   <url>
//!     <loc>https://example.com/</loc>
//!     <lastmod>2025-01-01</lastmod>
//!   </url>
//! </urlset>
//! ```

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use super::absolute_url;
use crate::config::{SiteInfoConfig, SitemapConfig};
use crate::log;
use crate::site::Metadata;
use crate::utils::html::escape;

const SITEMAP_NS: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";

/// Write `sitemap.xml` into `out_dir` if enabled.
pub fn write_sitemap(
    info: &SiteInfoConfig,
    config: &SitemapConfig,
    pages: &[Metadata],
    out_dir: &Path,
) -> Result<()> {
    if !config.enable {
        return Ok(());
    }

    let xml = sitemap_xml(info.url.as_deref().unwrap_or_default(), pages);
    let path = out_dir.join(&config.path);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&path, xml)
        .with_context(|| format!("Failed to write sitemap to {}", path.display()))?;

    log!("sitemap"; "{}", config.path.display());
    Ok(())
}

fn sitemap_xml(base_url: &str, pages: &[Metadata]) -> String {
    let mut xml = String::with_capacity(128 + pages.len() * 96);

    xml.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    xml.push_str("<urlset xmlns=\"");
    xml.push_str(SITEMAP_NS);
    xml.push_str("\">\n");

    for page in pages {
        xml.push_str("  <url>\n    <loc>");
        xml.push_str(&escape(&absolute_url(base_url, &page.route)));
        xml.push_str("</loc>\n");
        if let Some(date) = &page.date {
            xml.push_str("    <lastmod>");
            xml.push_str(&escape(date));
            xml.push_str("</lastmod>\n");
        }
        xml.push_str("  </url>\n");
    }

    xml.push_str("</urlset>\n");
    xml
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn meta(route: &str, date: Option<&str>) -> Metadata {
        Metadata {
            route: route.into(),
            date: date.map(str::to_string),
            ..Metadata::default()
        }
    }

    #[test]
    fn test_sitemap_empty() {
        let xml = sitemap_xml("https://example.com", &[]);
        assert!(xml.contains(&format!(r#"<urlset xmlns="{SITEMAP_NS}">"#)));
        assert!(!xml.contains("<url>"));
    }

    #[test]
    fn test_sitemap_entries() {
        let pages = [meta("/", None), meta("/blog/a&b", Some("2024-06-15"))];
        let xml = sitemap_xml("https://example.com/", &pages);

        assert!(xml.contains("<loc>https://example.com/</loc>"));
        assert!(xml.contains("<loc>https://example.com/blog/a&amp;b</loc>"));
        assert!(xml.contains("<lastmod>2024-06-15</lastmod>"));
        assert_eq!(xml.matches("<url>").count(), 2);
    }

    #[test]
    fn test_write_sitemap_disabled() {
        let dir = TempDir::new().unwrap();
        write_sitemap(
            &SiteInfoConfig::default(),
            &SitemapConfig::default(),
            &[meta("/", None)],
            dir.path(),
        )
        .unwrap();
        assert!(!dir.path().join("sitemap.xml").exists());
    }
}
