//! Auxiliary files generated from page metadata.
//!
//! - **Sitemap**: search engine indexing (`sitemap.xml`)
//! - **RSS**: feed of dated pages (`rss.xml`)
//!
//! Both consume the metadata extracted for every page of the build, rendered
//! or skipped, so their output never depends on which pages changed.

pub mod rss;
pub mod sitemap;

/// Join the site base URL and a route.
fn absolute_url(base: &str, route: &str) -> String {
    format!("{}{}", base.trim_end_matches('/'), route)
}
