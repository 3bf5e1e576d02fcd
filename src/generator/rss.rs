//! RSS 2.0 feed generation from dated pages.

use anyhow::{Context, Result, anyhow};
use rss::{ChannelBuilder, GuidBuilder, ItemBuilder, validation::Validate};
use std::fs;
use std::path::Path;

use super::absolute_url;
use crate::config::{RssConfig, SiteInfoConfig};
use crate::log;
use crate::site::Metadata;
use crate::utils::date::UtcTime;

/// Write the RSS feed into `out_dir` if enabled.
pub fn write_rss(
    info: &SiteInfoConfig,
    config: &RssConfig,
    pages: &[Metadata],
    out_dir: &Path,
) -> Result<()> {
    if !config.enable {
        return Ok(());
    }

    let xml = rss_xml(info, pages)?;
    let path = out_dir.join(&config.path);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&path, xml).with_context(|| format!("Failed to write feed to {}", path.display()))?;

    log!("rss"; "{}", config.path.display());
    Ok(())
}

fn rss_xml(info: &SiteInfoConfig, pages: &[Metadata]) -> Result<String> {
    let base_url = info.url.as_deref().unwrap_or_default();

    // Newest first; undated pages are not feed entries
    let mut dated: Vec<(UtcTime, &Metadata)> = pages
        .iter()
        .filter_map(|p| Some((UtcTime::parse(p.date.as_deref()?)?, p)))
        .collect();
    dated.sort_by(|(a, _), (b, _)| b.cmp(a));

    let items: Vec<_> = dated
        .into_iter()
        .map(|(date, page)| {
            let link = absolute_url(base_url, &page.route);
            ItemBuilder::default()
                .title(page.title.clone())
                .link(Some(link.clone()))
                .guid(GuidBuilder::default().permalink(true).value(link).build())
                .description(page.description.clone())
                .pub_date(date.to_rfc2822())
                .build()
        })
        .collect();

    let channel = ChannelBuilder::default()
        .title(&info.title)
        .link(base_url)
        .description(&info.description)
        .language(Some(info.language.clone()))
        .generator("quire".to_string())
        .items(items)
        .build();

    channel
        .validate()
        .map_err(|e| anyhow!("RSS validation failed: {e}"))?;
    Ok(channel.to_string())
}
