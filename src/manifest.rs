//! Build manifest persistence.
//!
//! The manifest records, per output route, the hash of the source file that
//! produced it, plus the two global invalidators (shared data and runtime).
//! It lives inside the output directory and is rewritten from scratch at the
//! end of every successful incremental build.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::freshness::ContentHash;
use crate::site::PageDescriptor;
use crate::utils::date::UtcTime;

/// Manifest file name (inside the output directory)
pub const MANIFEST_FILE: &str = ".quire-manifest.json";

/// Cached state of one output page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageRecord {
    /// Hash of the source file at the time the page was produced
    pub hash: Option<ContentHash>,
    /// Source file path, relative to the project root
    pub file_path: PathBuf,
}

/// Persisted invalidation record of the last completed build.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    /// Output route -> page record
    #[serde(default)]
    pub pages: BTreeMap<String, PageRecord>,
    /// Fingerprint of the shared data file
    #[serde(default)]
    pub entities: Option<ContentHash>,
    /// Fingerprint of the generator internals that affect every page
    #[serde(default)]
    pub runtime: Option<ContentHash>,
    /// RFC 3339 creation time
    #[serde(default)]
    pub build_time: Option<String>,
}

impl Manifest {
    /// The "no usable prior manifest" sentinel.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Whether this is the sentinel (first build, forced clean, unreadable file).
    pub fn is_empty(&self) -> bool {
        self.entities.is_none()
    }

    /// Previous hash recorded for a route.
    pub fn page_hash(&self, route: &str) -> Option<ContentHash> {
        self.pages.get(route).and_then(|r| r.hash)
    }
}

/// Path of the manifest file for an output directory.
pub fn manifest_path(out_dir: &Path) -> PathBuf {
    out_dir.join(MANIFEST_FILE)
}

/// Load the manifest from `out_dir`.
///
/// Missing, unreadable or malformed files all yield the empty sentinel: a
/// cache miss, never a build failure.
pub fn load(out_dir: &Path) -> Manifest {
    let path = manifest_path(out_dir);

    let json = match fs::read_to_string(&path) {
        Ok(json) => json,
        Err(e) => {
            crate::debug!("manifest"; "no manifest at {}: {}", path.display(), e);
            return Manifest::empty();
        }
    };

    match serde_json::from_str::<Manifest>(&json) {
        Ok(manifest) => {
            crate::debug!("manifest"; "restored {} page records", manifest.pages.len());
            manifest
        }
        Err(e) => {
            crate::log!("manifest"; "ignoring unreadable manifest: {}", e);
            Manifest::empty()
        }
    }
}

/// Write the manifest to `out_dir`, replacing any previous one.
///
/// Writes a sibling temp file first and renames it into place, so an
/// interrupted save leaves the old manifest intact.
pub fn save(out_dir: &Path, manifest: &Manifest) -> Result<()> {
    let path = manifest_path(out_dir);
    let tmp = out_dir.join(format!("{MANIFEST_FILE}.tmp"));

    let json = serde_json::to_string_pretty(manifest)?;
    fs::write(&tmp, json).with_context(|| format!("Failed to write {}", tmp.display()))?;
    fs::rename(&tmp, &path)
        .with_context(|| format!("Failed to replace manifest {}", path.display()))?;

    crate::debug!("manifest"; "saved {} page records", manifest.pages.len());
    Ok(())
}

/// Build a fresh manifest from the pages of the build that just completed.
///
/// `sources` pairs each page with the hash of its source (not its rendered
/// output) taken when the build was planned. Never merges with a previous
/// manifest, so removed routes drop out. Source paths are stored relative
/// to `root`.
pub fn create_manifest(
    root: &Path,
    sources: &[(&PageDescriptor, Option<ContentHash>)],
    entities: Option<ContentHash>,
    runtime: Option<ContentHash>,
) -> Manifest {
    let pages = sources
        .iter()
        .map(|&(page, hash)| {
            let file_path = page.source.strip_prefix(root).unwrap_or(&page.source);
            let record = PageRecord {
                hash,
                file_path: file_path.to_path_buf(),
            };
            (page.route.clone(), record)
        })
        .collect();

    Manifest {
        pages,
        entities,
        runtime,
        build_time: Some(UtcTime::now().to_rfc3339()),
    }
}
