//! Global invalidator inputs.
//!
//! Two fingerprints cover everything that affects every page at once:
//! the shared data file and the generator runtime (config, templates and
//! the generator version).

use jwalk::WalkDir;
use std::path::{Path, PathBuf};

use crate::freshness::{ContentHash, hash_bytes, hash_file, hash_many};

/// Fingerprint of the shared data file.
///
/// A missing file is an empty data set, not an unknown one.
pub fn entities_hash(data_file: &Path) -> Option<ContentHash> {
    if !data_file.exists() {
        return Some(hash_bytes(b""));
    }
    hash_file(data_file)
}

/// Fingerprint of the generator runtime.
///
/// Inputs, in order: the config file, then every file under
/// `templates_dir` sorted by path. Paths are hashed relative to `root`. The
/// result is mixed with the crate version so an upgrade rebuilds everything.
pub fn runtime_hash(root: &Path, config_path: &Path, templates_dir: &Path) -> Option<ContentHash> {
    let mut inputs = vec![config_path.to_path_buf()];
    inputs.extend(template_files(templates_dir)?);

    let files = hash_many(root, &inputs)?;
    let mut mixed = Vec::with_capacity(64);
    mixed.extend_from_slice(files.as_bytes());
    mixed.extend_from_slice(env!("CARGO_PKG_VERSION").as_bytes());
    Some(hash_bytes(&mixed))
}

/// Every file under `dir`, sorted. `None` if the walk fails part way.
fn template_files(dir: &Path) -> Option<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Some(Vec::new());
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(dir).sort(true) {
        let entry = entry.ok()?;
        if entry.file_type().is_file() {
            files.push(entry.path());
        }
    }
    files.sort();
    Some(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_entities_hash_missing_file_is_empty_set() {
        let dir = TempDir::new().unwrap();
        let hash = entities_hash(&dir.path().join("entities.json"));
        assert_eq!(hash, Some(hash_bytes(b"")));
    }

    #[test]
    fn test_entities_hash_tracks_content() {
        let dir = TempDir::new().unwrap();
        let data = dir.path().join("entities.json");
        fs::write(&data, "{}").unwrap();
        let before = entities_hash(&data);

        fs::write(&data, r#"{"a": 1}"#).unwrap();
        let after = entities_hash(&data);

        assert!(before.is_some());
        assert_ne!(before, after);
    }

    #[test]
    fn test_runtime_hash_tracks_templates_and_config() {
        let dir = TempDir::new().unwrap();
        let config = dir.path().join("quire.toml");
        let templates = dir.path().join("templates");
        fs::write(&config, "").unwrap();
        fs::create_dir_all(templates.join("partials")).unwrap();
        fs::write(templates.join("layout.html"), "{{ content }}").unwrap();

        let runtime = || runtime_hash(dir.path(), &config, &templates);

        let base = runtime();
        assert!(base.is_some());
        assert_eq!(base, runtime());

        fs::write(templates.join("partials/nav.html"), "<nav>").unwrap();
        let with_partial = runtime();
        assert_ne!(base, with_partial);

        fs::write(&config, "[site]\ntitle = \"x\"").unwrap();
        assert_ne!(with_partial, runtime());
    }

    #[test]
    fn test_runtime_hash_missing_config_is_unknown() {
        let dir = TempDir::new().unwrap();
        let hash = runtime_hash(
            dir.path(),
            &dir.path().join("quire.toml"),
            &dir.path().join("templates"),
        );
        assert_eq!(hash, None);
    }

    #[test]
    fn test_runtime_hash_survives_moving_the_project() {
        let hash_project = || {
            let dir = TempDir::new().unwrap();
            let config = dir.path().join("quire.toml");
            let templates = dir.path().join("templates");
            fs::write(&config, "[site]\ntitle = \"Notes\"").unwrap();
            fs::create_dir_all(&templates).unwrap();
            fs::write(templates.join("layout.html"), "{{ content }}").unwrap();
            runtime_hash(dir.path(), &config, &templates)
        };

        let first = hash_project();
        assert!(first.is_some());
        assert_eq!(first, hash_project());
    }
}
