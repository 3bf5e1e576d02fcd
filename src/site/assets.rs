//! Static asset copying.
//!
//! Not incrementalized: every build copies the whole public directory.

use anyhow::{Context, Result};
use jwalk::WalkDir;
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};

/// Copy every file under `source` into `dest`, preserving layout.
///
/// A missing source directory is not an error (site has no assets).
pub fn copy_dir(source: &Path, dest: &Path) -> Result<()> {
    if !source.is_dir() {
        crate::debug!("assets"; "no assets directory at {}", source.display());
        return Ok(());
    }

    let files: Vec<PathBuf> = WalkDir::new(source)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .map(|e| e.path())
        .collect();

    files.par_iter().try_for_each(|path| -> Result<()> {
        let Ok(relative) = path.strip_prefix(source) else {
            return Ok(());
        };
        let target = dest.join(relative);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(path, &target).with_context(|| {
            format!(
                "Failed to copy asset {} to {}",
                path.display(),
                target.display()
            )
        })?;
        Ok(())
    })?;

    crate::debug!("assets"; "copied {}", crate::utils::plural_count(files.len(), "file"));
    Ok(())
}
