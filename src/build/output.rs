//! Output directory layout and mutation.

use anyhow::{Context, Result};
use rustc_hash::FxHashSet;
use std::fs;
use std::path::{Component, Path, PathBuf};

use crate::manifest::Manifest;
use crate::site::PageDescriptor;

/// HTML file for a route: `/` -> `index.html`, `/a/b` -> `a/b/index.html`.
///
/// `None` for routes that would escape the output directory.
pub fn page_file(out_dir: &Path, route: &str) -> Option<PathBuf> {
    let relative = Path::new(route.trim_start_matches('/'));
    if !relative
        .components()
        .all(|c| matches!(c, Component::Normal(_)))
    {
        return None;
    }
    Some(out_dir.join(relative).join("index.html"))
}

/// Delete and recreate (`clean`) or just ensure the output directory.
///
/// Without `clean` existing files are kept: reused pages live there.
pub fn prepare_output(out_dir: &Path, clean: bool) -> Result<()> {
    if clean && out_dir.exists() {
        fs::remove_dir_all(out_dir)
            .with_context(|| format!("Failed to clear output directory: {}", out_dir.display()))?;
    }
    fs::create_dir_all(out_dir)
        .with_context(|| format!("Failed to create output directory: {}", out_dir.display()))
}

/// Write a file, creating parent directories.
pub fn write_file(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }
    fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))
}

/// Remove output of routes recorded in `previous` but not in `current`.
///
/// Returns the number of files removed. Empty parent directories are
/// removed up to (not including) `out_dir`.
pub fn prune_stale(out_dir: &Path, previous: &Manifest, current: &[PageDescriptor]) -> usize {
    let live: FxHashSet<&str> = current.iter().map(|p| p.route.as_str()).collect();
    let mut removed = 0;

    for route in previous.pages.keys() {
        if live.contains(route.as_str()) {
            continue;
        }
        let Some(file) = page_file(out_dir, route) else {
            continue;
        };
        match fs::remove_file(&file) {
            Ok(()) => {
                crate::debug!("prune"; "removed {}", route);
                removed += 1;
                remove_empty_parents(out_dir, &file);
            }
            Err(e) => crate::debug!("prune"; "skip {}: {}", route, e),
        }
    }

    removed
}

fn remove_empty_parents(out_dir: &Path, file: &Path) {
    let mut dir = file.parent();
    while let Some(d) = dir {
        if d == out_dir || !d.starts_with(out_dir) || fs::remove_dir(d).is_err() {
            break;
        }
        dir = d.parent();
    }
}
