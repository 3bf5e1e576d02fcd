//! `quire.toml` section definitions.
//!
//! # Example
//!
//! ```toml
//! [site]
//! title = "My Site"
//! url = "https://example.com"
//! description = "Notes and posts"
//! language = "en"
//!
//! [build]
//! pages = "pages"             # Markdown sources (relative to site root)
//! public = "public"           # Static assets copied verbatim
//! output = "dist"             # Build output directory
//! data = "data/entities.json" # Shared data file (global invalidator)
//! templates = "templates"     # Layout files (runtime invalidator)
//! incremental = true          # Reuse unchanged pages between builds
//! prune = false               # Delete output of routes that disappeared
//!
//! [build.sitemap]
//! enable = true
//!
//! [build.rss]
//! enable = true
//! path = "rss.xml"
//!
//! [build.bundle]
//! command = ["npx", "esbuild", "--minify", "$QUIRE_OUTPUT_DIR/_quire/runtime.js"]
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// `[site]` metadata used by layouts, sitemap and RSS.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteInfoConfig {
    pub title: String,
    /// Absolute base URL, required for sitemap and RSS.
    pub url: Option<String>,
    pub description: String,
    pub language: String,
}

impl Default for SiteInfoConfig {
    fn default() -> Self {
        Self {
            title: String::new(),
            url: None,
            description: String::new(),
            language: "en".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildSectionConfig {
    /// Page source directory.
    pub pages: PathBuf,

    /// Static assets directory.
    pub public: PathBuf,

    /// Build output directory.
    pub output: PathBuf,

    /// Shared data file.
    pub data: PathBuf,

    /// Layout template directory.
    pub templates: PathBuf,

    /// Reuse unchanged pages between builds.
    pub incremental: bool,

    /// Remove output of routes that no longer exist.
    pub prune: bool,

    /// Clean output directory before building (CLI only).
    #[serde(skip)]
    pub clean: bool,

    /// Sitemap generation settings.
    pub sitemap: SitemapConfig,

    /// RSS generation settings.
    pub rss: RssConfig,

    /// External bundler step.
    pub bundle: BundleConfig,
}

impl Default for BuildSectionConfig {
    fn default() -> Self {
        Self {
            pages: "pages".into(),
            public: "public".into(),
            output: "dist".into(),
            data: "data/entities.json".into(),
            templates: "templates".into(),
            incremental: true,
            prune: false,
            clean: false,
            sitemap: SitemapConfig::default(),
            rss: RssConfig::default(),
            bundle: BundleConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SitemapConfig {
    /// Enable sitemap generation.
    pub enable: bool,
    /// Output path for sitemap file.
    pub path: PathBuf,
}

impl Default for SitemapConfig {
    fn default() -> Self {
        Self {
            enable: false,
            path: "sitemap.xml".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RssConfig {
    /// Enable RSS feed generation.
    pub enable: bool,
    /// Output path for feed file.
    pub path: PathBuf,
}

impl Default for RssConfig {
    fn default() -> Self {
        Self {
            enable: false,
            path: "rss.xml".into(),
        }
    }
}

/// Bundler invocation. Empty `command` disables the step.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BundleConfig {
    /// Program and arguments; `$QUIRE_OUTPUT_DIR` and `$QUIRE_ROOT` are expanded.
    pub command: Vec<String>,
}
