//! Incremental site build orchestration.
//!
//! Build phases, each depending on the previous:
//! - **Discover** - Find pages; failure aborts before any output mutation
//! - **Prepare** - Lock, load manifest, clean or keep the output directory
//! - **Assets** - Copy static assets (every build)
//! - **Plan** - Global hashes + rebuild planner
//! - **Pages** - Render changed pages, extract metadata for all pages
//! - **Runtime** - Regenerate the client route table (every build)
//! - **Bundle** - Run the bundler over the whole output (every build)
//! - **Finalize** - Prune, then persist a fresh manifest
//!
//! The manifest is written last, so it only ever describes a build that ran
//! to completion.

mod inputs;
mod lock;
mod output;

use inputs::{entities_hash, runtime_hash};
use lock::BuildLock;

use anyhow::{Context, Result};
use rayon::prelude::*;
use rustc_hash::FxHashSet;
use std::path::PathBuf;

use crate::config::{RssConfig, SiteConfig, SiteInfoConfig, SitemapConfig};
use crate::generator::{rss::write_rss, sitemap::write_sitemap};
use crate::logger::ProgressLine;
use crate::manifest::{self, Manifest};
use crate::planner::{self, RebuildPlan, RebuildReason};
use crate::site::{Metadata, PageDescriptor, RUNTIME_SCRIPT, Site, SiteContext};
use crate::utils::plural_count;
use crate::{debug, log};

/// Resolved options for one build.
#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Project root (lock file location)
    pub root: PathBuf,
    /// Config file (runtime invalidator input)
    pub config_path: PathBuf,
    pub pages_dir: PathBuf,
    pub output: PathBuf,
    /// Shared data file (entities invalidator input)
    pub data_file: PathBuf,
    /// Layout directory (runtime invalidator input)
    pub templates_dir: PathBuf,
    /// Reuse unchanged pages and persist a manifest
    pub incremental: bool,
    /// Ignore any manifest and rebuild from an empty output directory
    pub clean: bool,
    /// Delete output of routes that disappeared
    pub prune: bool,
    pub info: SiteInfoConfig,
    pub sitemap: SitemapConfig,
    pub rss: RssConfig,
}

impl BuildOptions {
    pub fn from_config(config: &SiteConfig) -> Self {
        let build = &config.build;
        Self {
            root: config.root.clone(),
            config_path: config.config_path.clone(),
            pages_dir: build.pages.clone(),
            output: build.output.clone(),
            data_file: build.data.clone(),
            templates_dir: build.templates.clone(),
            incremental: build.incremental,
            clean: build.clean,
            prune: build.prune,
            info: config.site.clone(),
            sitemap: build.sitemap.clone(),
            rss: build.rss.clone(),
        }
    }
}

/// Pages rendered vs. reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildSummary {
    pub changed: usize,
    pub skipped: usize,
}

/// Run one build.
pub fn run<S: Site>(site: &S, opts: &BuildOptions) -> Result<BuildSummary> {
    // Discover before touching anything on disk
    let pages = site
        .discover(&opts.pages_dir)
        .context("page discovery failed")?;
    debug!("build"; "discovered {}", plural_count(pages.len(), "page"));

    let _lock = BuildLock::acquire(&opts.root)?;

    let previous = if opts.incremental && !opts.clean {
        manifest::load(&opts.output)
    } else {
        Manifest::empty()
    };
    output::prepare_output(&opts.output, opts.clean || previous.is_empty())?;

    site.copy_assets(&opts.output)
        .context("failed to copy static assets")?;

    let entities = entities_hash(&opts.data_file);
    let runtime = runtime_hash(&opts.root, &opts.config_path, &opts.templates_dir);
    let plan = planner::plan(&pages, &previous, entities, runtime);
    log_plan(&plan);

    let ctx = site
        .build_context(&pages)
        .context("failed to build site context")?;

    let metadata = render_pages(site, &ctx, &pages, &plan.to_build, opts)?;

    write_sitemap(&opts.info, &opts.sitemap, &metadata, &opts.output)?;
    write_rss(&opts.info, &opts.rss, &metadata, &opts.output)?;

    let script = site
        .generate_runtime(&ctx, &pages)
        .context("failed to generate runtime script")?;
    output::write_file(&opts.output.join(RUNTIME_SCRIPT), &script)?;

    site.bundle(&opts.output).context("bundling failed")?;

    if opts.prune && !previous.is_empty() {
        let removed = output::prune_stale(&opts.output, &previous, &pages);
        if removed > 0 {
            log!("prune"; "removed {}", plural_count(removed, "stale page"));
        }
    }

    // Source hashes from planning, not re-read after the bundler ran
    if opts.incremental {
        let fresh = manifest::create_manifest(&opts.root, &plan.sources, entities, runtime);
        manifest::save(&opts.output, &fresh)?;
    }

    Ok(BuildSummary {
        changed: plan.to_build.len(),
        skipped: plan.to_skip.len(),
    })
}

/// Render `to_build` pages and extract metadata for every page.
///
/// Skipped pages go through metadata extraction only; no HTML is generated
/// and no file is written for them. Returns metadata in page order.
fn render_pages<S: Site>(
    site: &S,
    ctx: &SiteContext,
    pages: &[PageDescriptor],
    to_build: &[&PageDescriptor],
    opts: &BuildOptions,
) -> Result<Vec<Metadata>> {
    let changed: FxHashSet<&str> = to_build.iter().map(|p| p.route.as_str()).collect();
    let progress = ProgressLine::new(&[("render", changed.len())]);

    let metadata = pages
        .par_iter()
        .map(|page| -> Result<Metadata> {
            let entity = ctx.entity(page);

            if changed.contains(page.route.as_str()) {
                let html = site
                    .render(ctx, page, entity)
                    .with_context(|| {
                        format!("failed to render {} ({})", page.route, page.source.display())
                    })?;
                let file = output::page_file(&opts.output, &page.route)
                    .with_context(|| format!("invalid route {}", page.route))?;
                output::write_file(&file, &html)?;
                progress.inc("render");
            }

            site.extract(ctx, page, entity)
                .with_context(|| format!("failed to extract metadata of {}", page.route))
        })
        .collect::<Result<Vec<_>>>()?;

    progress.finish();
    Ok(metadata)
}

fn log_plan(plan: &RebuildPlan<'_>) {
    let pages = plural_count(plan.to_build.len(), "page");
    if !plan.is_full() {
        log!("build"; "{pages} changed, {} unchanged", plan.to_skip.len());
        return;
    }
    let cause = match plan.reason {
        RebuildReason::Entities => "shared data changed",
        _ => "layout or config changed",
    };
    log!("build"; "{cause}, rebuilding {pages}");
}
