//! `quire build` command.

use anyhow::Result;
use std::time::Instant;

use crate::build::{self, BuildOptions, BuildSummary};
use crate::config::SiteConfig;
use crate::log;
use crate::site::MarkdownSite;

/// Build the site described by `config` with the built-in Markdown site.
pub fn build_site(config: &SiteConfig) -> Result<BuildSummary> {
    let started = Instant::now();
    let site = MarkdownSite::new(config)?;
    let opts = BuildOptions::from_config(config);

    if opts.clean {
        log!("build"; "clean build into {}", opts.output.display());
    }

    let summary = build::run(&site, &opts)?;
    log!(
        "done";
        "{} changed, {} skipped in {:.2?}",
        summary.changed,
        summary.skipped,
        started.elapsed()
    );
    Ok(summary)
}
