//! Markdown rendering and metadata extraction.
//!
//! Layout placeholders (`{{ name }}`):
//!
//! | Placeholder        | Value                                   |
//! |--------------------|-----------------------------------------|
//! | `content`          | Rendered page body (raw HTML)           |
//! | `title`            | Page title                              |
//! | `lang`             | Page locale, else `[site].language`     |
//! | `route`            | Output route                            |
//! | `site.title`       | `[site].title`                          |
//! | `entity.<key>`     | Field of the page's data entity         |
//!
//! Unknown placeholders render as empty strings.

use anyhow::{Context, Result};
use pulldown_cmark::{Options, Parser, html};
use serde_json::Value;
use std::fs;

use super::front_matter::{self, FrontMatter};
use super::{Metadata, PageDescriptor, SiteContext};
use crate::utils::html::escape;

/// Render a page into its layout.
pub fn render_page(
    layout: &str,
    ctx: &SiteContext,
    page: &PageDescriptor,
    entity: Option<&Value>,
) -> Result<String> {
    let (meta, body) = read_page(page)?;
    let content = markdown_to_html(&body);
    let title = page_title(&meta, page, entity);
    let lang = page
        .locale
        .as_deref()
        .unwrap_or(&ctx.info.language)
        .to_string();

    Ok(fill_layout(layout, |key| match key {
        "content" => Some(content.clone()),
        "title" => Some(escape(&title).into_owned()),
        "lang" => Some(escape(&lang).into_owned()),
        "route" => Some(escape(&page.route).into_owned()),
        "site.title" => Some(escape(&ctx.info.title).into_owned()),
        _ => key
            .strip_prefix("entity.")
            .and_then(|field| entity?.get(field))
            .map(|v| escape(&value_text(v)).into_owned()),
    }))
}

/// Extract metadata from front matter without rendering the body.
pub fn extract_metadata(page: &PageDescriptor, entity: Option<&Value>) -> Result<Metadata> {
    let (meta, _) = read_page(page)?;
    Ok(Metadata {
        route: page.route.clone(),
        title: page_title(&meta, page, entity),
        description: meta.description.or_else(|| entity_str(entity, "description")),
        date: meta.date.or_else(|| entity_str(entity, "date")),
        locale: page.locale.clone(),
    })
}

fn read_page(page: &PageDescriptor) -> Result<(FrontMatter, String)> {
    let text = fs::read_to_string(&page.source)
        .with_context(|| format!("Failed to read {}", page.source.display()))?;
    let (meta, body) = front_matter::split(&text)
        .with_context(|| format!("Failed to load {}", page.source.display()))?;
    Ok((meta, body.to_string()))
}

/// Front matter title, else entity `title`, else module name.
fn page_title(meta: &FrontMatter, page: &PageDescriptor, entity: Option<&Value>) -> String {
    meta.title
        .clone()
        .or_else(|| entity_str(entity, "title"))
        .unwrap_or_else(|| page.module.clone())
}

fn entity_str(entity: Option<&Value>, key: &str) -> Option<String> {
    entity?.get(key)?.as_str().map(str::to_string)
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn markdown_to_html(markdown: &str) -> String {
    let options = Options::ENABLE_TABLES
        | Options::ENABLE_FOOTNOTES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS
        | Options::ENABLE_HEADING_ATTRIBUTES;
    let parser = Parser::new_ext(markdown, options);

    let mut out = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut out, parser);
    out
}

/// Substitute `{{ key }}` placeholders.
fn fill_layout(layout: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut out = String::with_capacity(layout.len() * 2);
    let mut rest = layout;

    while let Some(start) = rest.find("{{") {
        let Some(len) = rest[start + 2..].find("}}") else {
            break;
        };
        out.push_str(&rest[..start]);
        let key = rest[start + 2..start + 2 + len].trim();
        out.push_str(&lookup(key).unwrap_or_default());
        rest = &rest[start + 2 + len + 2..];
    }

    out.push_str(rest);
    out
}
