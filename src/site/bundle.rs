//! External bundler step.
//!
//! Runs the configured command once over the whole output directory.
//! `$QUIRE_OUTPUT_DIR` and `$QUIRE_ROOT` in arguments are expanded and also
//! exported as environment variables.

use anyhow::{Context, Result, bail};
use rustc_hash::FxHashMap;
use std::path::Path;
use std::process::Command;

use crate::config::BundleConfig;

/// Build `$QUIRE_*` variables for the bundler.
fn bundle_vars(root: &Path, out_dir: &Path) -> FxHashMap<&'static str, String> {
    let mut vars = FxHashMap::default();
    vars.insert("QUIRE_OUTPUT_DIR", out_dir.display().to_string());
    vars.insert("QUIRE_ROOT", root.display().to_string());
    vars
}

/// Replace `$QUIRE_XXX` occurrences in arguments.
fn resolve_args(args: &[String], vars: &FxHashMap<&'static str, String>) -> Vec<String> {
    args.iter()
        .map(|arg| {
            vars.iter().fold(arg.clone(), |acc, (key, value)| {
                acc.replace(&format!("${key}"), value)
            })
        })
        .collect()
}

/// Run the bundler. An empty command skips the step.
pub fn run_bundler(config: &BundleConfig, root: &Path, out_dir: &Path) -> Result<()> {
    let vars = bundle_vars(root, out_dir);
    let resolved = resolve_args(&config.command, &vars);
    let Some((program, args)) = resolved.split_first() else {
        crate::debug!("bundle"; "no bundler configured");
        return Ok(());
    };

    crate::log!("bundle"; "`{}` running", program);
    let output = Command::new(program)
        .args(args)
        .current_dir(root)
        .envs(vars.iter().map(|(k, v)| (*k, v.as_str())))
        .output()
        .with_context(|| format!("Failed to execute `{program}`"))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!(
            "Command `{program}` failed with {}\n{}",
            output.status,
            stderr.trim()
        );
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stdout = stdout.trim();
    if !stdout.is_empty() {
        crate::debug!("bundle"; "{}", stdout);
    }
    Ok(())
}
