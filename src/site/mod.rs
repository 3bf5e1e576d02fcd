//! Page collaborators: discovery, shared context, rendering, metadata,
//! static assets, runtime script and bundling.
//!
//! The build orchestrator only talks to the [`Site`] trait. [`MarkdownSite`]
//! is the built-in implementation over a directory of Markdown files.

mod assets;
mod bundle;
mod discover;
mod front_matter;
mod render;
mod runtime;

pub use runtime::RUNTIME_SCRIPT;

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::{SiteConfig, SiteInfoConfig};

/// One routable output unit, produced by discovery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageDescriptor {
    /// Output route, e.g. `/blog/post-1`
    pub route: String,
    /// Source file the page is generated from
    pub source: PathBuf,
    /// Locale tag (`about.fr.md` -> `fr`)
    pub locale: Option<String>,
    /// Module name used to look up the page's entity, e.g. `blog/post-1`
    pub module: String,
}

/// Page metadata consumed by sitemap and RSS writers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Metadata {
    pub route: String,
    pub title: String,
    pub date: Option<String>,
    pub description: Option<String>,
    pub locale: Option<String>,
}

/// Shared data built once per build and handed to every page.
#[derive(Debug, Clone, Default)]
pub struct SiteContext {
    /// Site metadata from config
    pub info: SiteInfoConfig,
    /// Shared data file, keyed by page module name
    pub entities: Map<String, Value>,
    /// Every route discovered in this build (sorted)
    pub routes: Vec<String>,
}

impl SiteContext {
    /// Entity associated with a page, if the data file has one.
    pub fn entity(&self, page: &PageDescriptor) -> Option<&Value> {
        self.entities.get(&page.module)
    }
}

/// External collaborators invoked by the build orchestrator.
pub trait Site: Sync {
    /// Find every page under `pages_dir`. Errors abort the build.
    fn discover(&self, pages_dir: &Path) -> Result<Vec<PageDescriptor>>;

    /// Build the shared context once for the whole build.
    fn build_context(&self, pages: &[PageDescriptor]) -> Result<SiteContext>;

    /// Render a page to HTML.
    fn render(&self, ctx: &SiteContext, page: &PageDescriptor, entity: Option<&Value>)
    -> Result<String>;

    /// Extract sitemap/RSS metadata without rendering.
    fn extract(
        &self,
        ctx: &SiteContext,
        page: &PageDescriptor,
        entity: Option<&Value>,
    ) -> Result<Metadata>;

    /// Copy static assets into `out_dir`.
    fn copy_assets(&self, out_dir: &Path) -> Result<()>;

    /// Client runtime script for the full page list.
    fn generate_runtime(&self, ctx: &SiteContext, pages: &[PageDescriptor]) -> Result<String>;

    /// Post-process the whole output directory.
    fn bundle(&self, out_dir: &Path) -> Result<()>;
}

/// Default layout used when `templates/layout.html` does not exist.
const DEFAULT_LAYOUT: &str = r#"<!DOCTYPE html>
<html lang="{{ lang }}">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{{ title }}</title>
<script src="/_quire/runtime.js" defer></script>
</head>
<body>
<main data-route="{{ route }}">
{{ content }}
</main>
</body>
</html>
"#;

/// Layout file name inside the templates directory
pub const LAYOUT_FILE: &str = "layout.html";

/// Built-in site over Markdown sources.
pub struct MarkdownSite {
    config: SiteConfig,
    layout: String,
}

impl MarkdownSite {
    /// Create a site, loading the layout template.
    pub fn new(config: &SiteConfig) -> Result<Self> {
        let layout_path = config.build.templates.join(LAYOUT_FILE);
        let layout = if layout_path.is_file() {
            fs::read_to_string(&layout_path)
                .with_context(|| format!("Failed to read layout {}", layout_path.display()))?
        } else {
            DEFAULT_LAYOUT.to_string()
        };

        Ok(Self {
            config: config.clone(),
            layout,
        })
    }

    /// Read the shared data file as a JSON object. Missing file -> empty.
    fn load_entities(&self) -> Result<Map<String, Value>> {
        let path = &self.config.build.data;
        if !path.exists() {
            return Ok(Map::new());
        }

        let json = fs::read_to_string(path)
            .with_context(|| format!("Failed to read data file {}", path.display()))?;
        match serde_json::from_str(&json)
            .with_context(|| format!("Failed to parse data file {}", path.display()))?
        {
            Value::Object(map) => Ok(map),
            _ => anyhow::bail!("data file {} must be a JSON object", path.display()),
        }
    }
}

impl Site for MarkdownSite {
    fn discover(&self, pages_dir: &Path) -> Result<Vec<PageDescriptor>> {
        let pages = discover::discover_pages(pages_dir)?;
        discover::check_asset_conflicts(&pages, &self.config.build.public)?;
        Ok(pages)
    }

    fn build_context(&self, pages: &[PageDescriptor]) -> Result<SiteContext> {
        Ok(SiteContext {
            info: self.config.site.clone(),
            entities: self.load_entities()?,
            routes: pages.iter().map(|p| p.route.clone()).collect(),
        })
    }

    fn render(
        &self,
        ctx: &SiteContext,
        page: &PageDescriptor,
        entity: Option<&Value>,
    ) -> Result<String> {
        render::render_page(&self.layout, ctx, page, entity)
    }

    fn extract(
        &self,
        _ctx: &SiteContext,
        page: &PageDescriptor,
        entity: Option<&Value>,
    ) -> Result<Metadata> {
        render::extract_metadata(page, entity)
    }

    fn copy_assets(&self, out_dir: &Path) -> Result<()> {
        assets::copy_dir(&self.config.build.public, out_dir)
    }

    fn generate_runtime(&self, _ctx: &SiteContext, pages: &[PageDescriptor]) -> Result<String> {
        runtime::generate_runtime(pages)
    }

    fn bundle(&self, out_dir: &Path) -> Result<()> {
        bundle::run_bundler(&self.config.build.bundle, &self.config.root, out_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn site_in(dir: &Path) -> MarkdownSite {
        let mut config = SiteConfig::default();
        config.set_root(dir);
        MarkdownSite::new(&config).unwrap()
    }

    fn page(module: &str) -> PageDescriptor {
        PageDescriptor {
            route: format!("/{module}"),
            source: PathBuf::from(format!("{module}.md")),
            locale: None,
            module: module.to_string(),
        }
    }

    #[test]
    fn test_default_layout_without_templates() {
        let dir = TempDir::new().unwrap();
        let site = site_in(dir.path());
        assert_eq!(site.layout, DEFAULT_LAYOUT);
    }

    #[test]
    fn test_custom_layout() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("templates")).unwrap();
        fs::write(dir.path().join("templates/layout.html"), "<x>{{ content }}</x>").unwrap();

        let site = site_in(dir.path());
        assert_eq!(site.layout, "<x>{{ content }}</x>");
    }

    #[test]
    fn test_context_entities_by_module() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("data")).unwrap();
        fs::write(
            dir.path().join("data/entities.json"),
            r#"{"blog/post": {"title": "From data"}}"#,
        )
        .unwrap();

        let site = site_in(dir.path());
        let pages = vec![page("blog/post"), page("about")];
        let ctx = site.build_context(&pages).unwrap();

        assert_eq!(ctx.routes, ["/blog/post", "/about"]);
        assert_eq!(ctx.entity(&pages[0]).unwrap()["title"], "From data");
        assert!(ctx.entity(&pages[1]).is_none());
    }

    #[test]
    fn test_context_missing_data_file() {
        let dir = TempDir::new().unwrap();
        let ctx = site_in(dir.path()).build_context(&[]).unwrap();
        assert!(ctx.entities.is_empty());
    }

    #[test]
    fn test_context_rejects_non_object_data() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("data")).unwrap();
        fs::write(dir.path().join("data/entities.json"), "[1, 2]").unwrap();

        assert!(site_in(dir.path()).build_context(&[]).is_err());
    }
}
