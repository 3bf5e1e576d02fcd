//! Rebuild planning: which pages must be rendered, which can be reused.
//!
//! Pure decision logic. Takes the page set, the previous manifest and the
//! current global hashes, and partitions pages without touching the output
//! directory.

use rayon::prelude::*;

use crate::freshness::{self, ContentHash};
use crate::manifest::Manifest;
use crate::site::PageDescriptor;

/// Why pages ended up in `to_build`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RebuildReason {
    /// Shared data file changed (or no usable manifest)
    Entities,
    /// Generator internals changed
    Runtime,
    /// Per-page comparison
    Pages,
}

/// Partition of the discovered pages.
#[derive(Debug)]
pub struct RebuildPlan<'a> {
    pub to_build: Vec<&'a PageDescriptor>,
    pub to_skip: Vec<&'a PageDescriptor>,
    pub reason: RebuildReason,
    /// Every page with the source hash it was planned against, in page order.
    pub sources: Vec<(&'a PageDescriptor, Option<ContentHash>)>,
}

impl RebuildPlan<'_> {
    /// Whether every page is rebuilt because of a global invalidator.
    pub fn is_full(&self) -> bool {
        self.reason != RebuildReason::Pages
    }
}

/// Hash equality where an unknown hash never matches anything.
#[inline]
fn same(previous: Option<ContentHash>, current: Option<ContentHash>) -> bool {
    matches!((previous, current), (Some(a), Some(b)) if a == b)
}

/// Plan a build, hashing each page's source file.
pub fn plan<'a>(
    pages: &'a [PageDescriptor],
    manifest: &Manifest,
    entities: Option<ContentHash>,
    runtime: Option<ContentHash>,
) -> RebuildPlan<'a> {
    plan_with(pages, manifest, entities, runtime, |page| {
        freshness::hash_file(&page.source)
    })
}

/// Plan a build with a caller-supplied page hash function.
///
/// Every page is hashed exactly once, even on a full rebuild, so the next
/// manifest records the same source state the decision was made on.
///
/// First match wins:
/// 1. entities hash differs: rebuild everything
/// 2. runtime hash differs: rebuild everything
/// 3. per page: rebuild unless the source hash equals the recorded one
pub fn plan_with<'a, F>(
    pages: &'a [PageDescriptor],
    manifest: &Manifest,
    entities: Option<ContentHash>,
    runtime: Option<ContentHash>,
    hash_page: F,
) -> RebuildPlan<'a>
where
    F: Fn(&PageDescriptor) -> Option<ContentHash> + Sync,
{
    let sources: Vec<(&'a PageDescriptor, Option<ContentHash>)> = pages
        .par_iter()
        .map(|page| (page, hash_page(page)))
        .collect();

    let global = if !same(manifest.entities, entities) {
        Some(RebuildReason::Entities)
    } else if !same(manifest.runtime, runtime) {
        Some(RebuildReason::Runtime)
    } else {
        None
    };

    if let Some(reason) = global {
        return RebuildPlan {
            to_build: pages.iter().collect(),
            to_skip: Vec::new(),
            reason,
            sources,
        };
    }

    let (to_skip, to_build): (Vec<_>, Vec<_>) = sources
        .iter()
        .map(|&(page, hash)| (page, same(manifest.page_hash(&page.route), hash)))
        .partition(|&(_, fresh)| fresh);

    RebuildPlan {
        to_build: to_build.into_iter().map(|(p, _)| p).collect(),
        to_skip: to_skip.into_iter().map(|(p, _)| p).collect(),
        reason: RebuildReason::Pages,
        sources,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::freshness::hash_bytes;
    use crate::manifest::PageRecord;
    use rustc_hash::FxHashMap;
    use std::path::PathBuf;

    fn page(route: &str) -> PageDescriptor {
        PageDescriptor {
            route: route.to_string(),
            source: PathBuf::from(format!("pages{route}.md")),
            locale: None,
            module: route.trim_start_matches('/').to_string(),
        }
    }

    fn h(s: &str) -> ContentHash {
        hash_bytes(s.as_bytes())
    }

    fn manifest(pages: &[(&str, &str)], entities: &str, runtime: &str) -> Manifest {
        Manifest {
            pages: pages
                .iter()
                .map(|(route, hash)| {
                    let record = PageRecord {
                        hash: Some(h(hash)),
                        file_path: PathBuf::from(format!("pages{route}.md")),
                    };
                    (route.to_string(), record)
                })
                .collect(),
            entities: Some(h(entities)),
            runtime: Some(h(runtime)),
            build_time: None,
        }
    }

    /// Hash function backed by a fixed route -> content table.
    fn hashes(table: &[(&str, Option<&str>)]) -> impl Fn(&PageDescriptor) -> Option<ContentHash> {
        let map: FxHashMap<String, Option<ContentHash>> = table
            .iter()
            .map(|(route, content)| (route.to_string(), content.map(h)))
            .collect();
        move |page| map.get(&page.route).copied().flatten()
    }

    fn routes(pages: &[&PageDescriptor]) -> Vec<String> {
        pages.iter().map(|p| p.route.clone()).collect()
    }

    #[test]
    fn test_local_change_rebuilds_only_that_page() {
        let pages = vec![page("/a"), page("/b")];
        let prev = manifest(&[("/a", "h1"), ("/b", "old")], "e1", "r1");

        let plan = plan_with(
            &pages,
            &prev,
            Some(h("e1")),
            Some(h("r1")),
            hashes(&[("/a", Some("h1")), ("/b", Some("h2"))]),
        );

        assert_eq!(routes(&plan.to_build), ["/b"]);
        assert_eq!(routes(&plan.to_skip), ["/a"]);
        assert_eq!(plan.reason, RebuildReason::Pages);
        assert!(!plan.is_full());
    }

    #[test]
    fn test_entities_change_rebuilds_everything() {
        let pages = vec![page("/a"), page("/b")];
        let prev = manifest(&[("/a", "h1"), ("/b", "h2")], "e1", "r1");

        let plan = plan_with(
            &pages,
            &prev,
            Some(h("e2")),
            Some(h("r1")),
            hashes(&[("/a", Some("h1")), ("/b", Some("h2"))]),
        );

        assert_eq!(routes(&plan.to_build), ["/a", "/b"]);
        assert!(plan.to_skip.is_empty());
        assert_eq!(plan.reason, RebuildReason::Entities);
    }

    #[test]
    fn test_runtime_change_rebuilds_everything() {
        let pages = vec![page("/a"), page("/b")];
        let prev = manifest(&[("/a", "h1"), ("/b", "h2")], "e1", "r1");

        let plan = plan_with(
            &pages,
            &prev,
            Some(h("e1")),
            Some(h("r2")),
            hashes(&[("/a", Some("h1")), ("/b", Some("h2"))]),
        );

        assert_eq!(plan.to_build.len(), 2);
        assert!(plan.to_skip.is_empty());
        assert_eq!(plan.reason, RebuildReason::Runtime);
    }

    #[test]
    fn test_entities_checked_before_runtime() {
        let pages = vec![page("/a")];
        let prev = manifest(&[("/a", "h1")], "e1", "r1");

        let plan = plan_with(&pages, &prev, Some(h("e2")), Some(h("r2")), |_| None);
        assert_eq!(plan.reason, RebuildReason::Entities);
    }

    #[test]
    fn test_sentinel_manifest_rebuilds_everything() {
        let pages = vec![page("/a")];

        let plan = plan_with(
            &pages,
            &Manifest::empty(),
            Some(h("e1")),
            Some(h("r1")),
            hashes(&[("/a", Some("h1"))]),
        );

        assert!(plan.is_full());
        assert_eq!(plan.to_build.len(), 1);
    }

    #[test]
    fn test_unknown_global_hash_never_matches() {
        let pages = vec![page("/a")];
        let mut prev = manifest(&[("/a", "h1")], "e1", "r1");
        prev.runtime = None;

        let plan = plan_with(
            &pages,
            &prev,
            Some(h("e1")),
            None,
            hashes(&[("/a", Some("h1"))]),
        );
        assert_eq!(plan.reason, RebuildReason::Runtime);
    }

    #[test]
    fn test_new_page_is_built() {
        let pages = vec![page("/a"), page("/new")];
        let prev = manifest(&[("/a", "h1")], "e1", "r1");

        let plan = plan_with(
            &pages,
            &prev,
            Some(h("e1")),
            Some(h("r1")),
            hashes(&[("/a", Some("h1")), ("/new", Some("n"))]),
        );

        assert_eq!(routes(&plan.to_build), ["/new"]);
        assert_eq!(routes(&plan.to_skip), ["/a"]);
    }

    #[test]
    fn test_unreadable_source_is_built() {
        let pages = vec![page("/a"), page("/b")];
        let prev = manifest(&[("/a", "h1"), ("/b", "h2")], "e1", "r1");

        let plan = plan_with(
            &pages,
            &prev,
            Some(h("e1")),
            Some(h("r1")),
            hashes(&[("/a", Some("h1")), ("/b", None)]),
        );

        assert_eq!(routes(&plan.to_build), ["/b"]);
        assert_eq!(routes(&plan.to_skip), ["/a"]);
    }

    #[test]
    fn test_unchanged_build_skips_everything() {
        let pages = vec![page("/a"), page("/b"), page("/c")];
        let prev = manifest(&[("/a", "1"), ("/b", "2"), ("/c", "3")], "e1", "r1");

        let plan = plan_with(
            &pages,
            &prev,
            Some(h("e1")),
            Some(h("r1")),
            hashes(&[("/a", Some("1")), ("/b", Some("2")), ("/c", Some("3"))]),
        );

        assert!(plan.to_build.is_empty());
        assert_eq!(routes(&plan.to_skip), ["/a", "/b", "/c"]);
    }

    #[test]
    fn test_plan_reads_source_files() {
        let dir = tempfile::TempDir::new().unwrap();
        let source = dir.path().join("a.md");
        std::fs::write(&source, "h1").unwrap();

        let mut a = page("/a");
        a.source = source;
        let pages = vec![a];
        let prev = manifest(&[("/a", "h1")], "e1", "r1");

        let plan = plan(&pages, &prev, Some(h("e1")), Some(h("r1")));
        assert_eq!(plan.to_skip.len(), 1);
        assert_eq!(plan.sources[0].1, Some(h("h1")));
    }

    #[test]
    fn test_full_rebuild_still_records_source_hashes() {
        let pages = vec![page("/a"), page("/b")];
        let prev = manifest(&[("/a", "h1"), ("/b", "h2")], "e1", "r1");

        let plan = plan_with(
            &pages,
            &prev,
            Some(h("e2")),
            Some(h("r1")),
            hashes(&[("/a", Some("h1")), ("/b", None)]),
        );

        assert!(plan.is_full());
        let recorded: Vec<_> = plan
            .sources
            .iter()
            .map(|(p, hash)| (p.route.as_str(), *hash))
            .collect();
        assert_eq!(recorded, [("/a", Some(h("h1"))), ("/b", None)]);
    }
}
