//! Exclusive build lock.
//!
//! Two builds against the same project would race on output deletion and
//! manifest writes. The lock file is created with `create_new` and removed
//! when the guard drops, whether the build succeeded or not.

use anyhow::{Context, Result, bail};
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

/// Lock file path, relative to the project root
pub const LOCK_FILE: &str = ".quire/build.lock";

/// Held for the duration of one build.
#[derive(Debug)]
pub struct BuildLock {
    path: PathBuf,
}

impl BuildLock {
    /// Take the lock for `root`, failing if another build holds it.
    pub fn acquire(root: &Path) -> Result<Self> {
        let path = root.join(LOCK_FILE);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => bail!(
                "another build is running (lock file {}); remove it if no build is running",
                path.display()
            ),
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to create {}", path.display()));
            }
        };
        writeln!(file, "{}", std::process::id()).ok();

        crate::debug!("lock"; "acquired {}", path.display());
        Ok(Self { path })
    }
}

impl Drop for BuildLock {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            crate::debug!("lock"; "failed to release {}: {}", self.path.display(), e);
        }
    }
}
