//! Page discovery: Markdown files under the pages directory.
//!
//! Route derivation:
//!
//! | Source                 | Route          | Module       | Locale |
//! |------------------------|----------------|--------------|--------|
//! | `index.md`             | `/`            | `index`      |        |
//! | `blog/index.md`        | `/blog`        | `blog/index` |        |
//! | `blog/post-1.md`       | `/blog/post-1` | `blog/post-1`|        |
//! | `about.fr.md`          | `/fr/about`    | `about`      | `fr`   |

use jwalk::WalkDir;
use rustc_hash::FxHashMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use super::PageDescriptor;
use super::front_matter::{self, FrontMatterError};

/// Page source extension
const PAGE_EXT: &str = "md";

#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("pages directory `{0}` does not exist")]
    MissingDir(PathBuf),

    #[error("failed to walk `{0}`")]
    Walk(PathBuf, #[source] jwalk::Error),

    #[error("failed to read page `{0}`")]
    Read(PathBuf, #[source] std::io::Error),

    #[error("failed to load page `{0}`")]
    FrontMatter(PathBuf, #[source] FrontMatterError),

    #[error("route `{route}` is claimed by both `{}` and `{}`", .first.display(), .second.display())]
    RouteConflict {
        route: String,
        first: PathBuf,
        second: PathBuf,
    },

    #[error("route `{route}` is also written by static asset `{}`", .asset.display())]
    AssetConflict { route: String, asset: PathBuf },
}

/// Discover every non-draft page, sorted by route.
///
/// Any unreadable or malformed page fails the whole discovery.
pub fn discover_pages(pages_dir: &Path) -> Result<Vec<PageDescriptor>, DiscoveryError> {
    if !pages_dir.is_dir() {
        return Err(DiscoveryError::MissingDir(pages_dir.to_path_buf()));
    }

    let mut sources = Vec::new();
    for entry in WalkDir::new(pages_dir).sort(true) {
        let entry = entry.map_err(|e| DiscoveryError::Walk(pages_dir.to_path_buf(), e))?;
        let path = entry.path();
        if entry.file_type().is_file() && path.extension().is_some_and(|ext| ext == PAGE_EXT) {
            sources.push(path);
        }
    }

    let mut pages = Vec::with_capacity(sources.len());
    let mut claimed: FxHashMap<String, PathBuf> = FxHashMap::default();

    for source in sources {
        let text =
            fs::read_to_string(&source).map_err(|e| DiscoveryError::Read(source.clone(), e))?;
        let (meta, _) = front_matter::split(&text)
            .map_err(|e| DiscoveryError::FrontMatter(source.clone(), e))?;
        if meta.draft {
            crate::debug!("discover"; "skipping draft {}", source.display());
            continue;
        }

        let Ok(relative) = source.strip_prefix(pages_dir) else {
            continue;
        };
        let page = describe(relative, source.clone());

        if let Some(first) = claimed.insert(page.route.clone(), source.clone()) {
            return Err(DiscoveryError::RouteConflict {
                route: page.route,
                first,
                second: source,
            });
        }
        pages.push(page);
    }

    pages.sort_by(|a, b| a.route.cmp(&b.route));
    Ok(pages)
}

/// Reject pages whose output file a static asset would overwrite.
///
/// Assets are copied on every build, so such an asset would silently replace
/// a reused page's HTML.
pub fn check_asset_conflicts(
    pages: &[PageDescriptor],
    public_dir: &Path,
) -> Result<(), DiscoveryError> {
    if !public_dir.is_dir() {
        return Ok(());
    }

    for page in pages {
        let asset = public_dir
            .join(page.route.trim_start_matches('/'))
            .join("index.html");
        if asset.is_file() {
            return Err(DiscoveryError::AssetConflict {
                route: page.route.clone(),
                asset,
            });
        }
    }
    Ok(())
}

/// Derive route, module and locale from a path relative to the pages dir.
fn describe(relative: &Path, source: PathBuf) -> PageDescriptor {
    let stem = relative
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let (name, locale) = split_locale(&stem);

    let mut segments: Vec<String> = relative
        .parent()
        .into_iter()
        .flat_map(Path::components)
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    segments.push(name.to_string());
    let module = segments.join("/");

    if name == "index" {
        segments.pop();
    }
    if let Some(locale) = locale {
        segments.insert(0, locale.to_string());
    }
    let route = format!("/{}", segments.join("/"));

    PageDescriptor {
        route,
        source,
        locale: locale.map(str::to_string),
        module,
    }
}

/// `about.fr` -> (`about`, Some(`fr`)); `pt-br` style tags are accepted.
fn split_locale(stem: &str) -> (&str, Option<&str>) {
    match stem.rsplit_once('.') {
        Some((name, tag)) if !name.is_empty() && is_locale(tag) => (name, Some(tag)),
        _ => (stem, None),
    }
}

/// Two lowercase letters, optionally followed by `-` and two more.
fn is_locale(tag: &str) -> bool {
    let pair = |s: &str| s.len() == 2 && s.bytes().all(|b| b.is_ascii_lowercase());
    match tag.split_once('-') {
        Some((lang, region)) => pair(lang) && pair(region),
        None => pair(tag),
    }
}
