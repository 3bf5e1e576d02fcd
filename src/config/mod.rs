//! Site configuration management for `quire.toml`.
//!
//! # Sections
//!
//! | Section            | Purpose                                         |
//! |--------------------|-------------------------------------------------|
//! | `[site]`           | Site metadata (title, url, description, lang)   |
//! | `[build]`          | Paths, incremental mode, pruning                |
//! | `[build.sitemap]`  | sitemap.xml generation                          |
//! | `[build.rss]`      | RSS feed generation                             |
//! | `[build.bundle]`   | External bundler command                        |

mod error;
mod section;
mod util;

pub use error::ConfigError;
pub use section::{BuildSectionConfig, BundleConfig, RssConfig, SiteInfoConfig, SitemapConfig};

use crate::cli::{BuildArgs, Cli, Commands};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};
use util::{find_config_file, normalize_path};

/// Root configuration structure representing quire.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Absolute path to the config file (internal use only)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Project root directory - parent of config file (internal use only)
    #[serde(skip)]
    pub root: PathBuf,

    /// Site metadata
    #[serde(default)]
    pub site: SiteInfoConfig,

    /// Build settings
    #[serde(default)]
    pub build: BuildSectionConfig,
}

impl SiteConfig {
    /// Load configuration for a CLI invocation.
    ///
    /// Searches upward from cwd for the config file; the project root is the
    /// config file's parent directory.
    pub fn load(cli: &Cli) -> Result<Self, ConfigError> {
        let cwd = std::env::current_dir().map_err(|e| ConfigError::Io(PathBuf::from("."), e))?;
        let config_path = find_config_file(&cwd, &cli.config)
            .ok_or_else(|| ConfigError::NotFound(cli.config.clone()))?;

        let mut config = Self::from_path(&config_path)?;
        match &cli.command {
            Commands::Build { build_args } => config.apply_build_args(build_args),
        }
        config.validate()?;
        Ok(config)
    }

    /// Parse a config file and resolve its paths against its directory.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        let mut config: Self = toml::from_str(&content)?;

        let config_path = path
            .canonicalize()
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        let root = config_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();

        config.config_path = config_path;
        config.set_root(&root);
        Ok(config)
    }

    /// Set the project root and make every build path absolute.
    pub fn set_root(&mut self, root: &Path) {
        self.root = root.to_path_buf();
        let build = &mut self.build;
        for path in [
            &mut build.pages,
            &mut build.public,
            &mut build.output,
            &mut build.data,
            &mut build.templates,
        ] {
            *path = root.join(&*path);
        }
    }

    /// Apply command-line overrides.
    fn apply_build_args(&mut self, args: &BuildArgs) {
        let build = &mut self.build;
        build.clean = args.clean;
        if let Some(output) = &args.output {
            build.output = self.root.join(output);
        }
        Self::update_option(&mut build.incremental, args.incremental.as_ref());
        Self::update_option(&mut build.prune, args.prune.as_ref());
        Self::update_option(&mut build.sitemap.enable, args.sitemap.as_ref());
        Self::update_option(&mut build.rss.enable, args.rss.as_ref());
        crate::logger::set_verbose(args.verbose);
    }

    fn update_option<T: Clone>(target: &mut T, value: Option<&T>) {
        if let Some(v) = value {
            *target = v.clone();
        }
    }

    /// Reject configurations that would let the build destroy its own inputs.
    ///
    /// The output directory may not contain, or sit inside, any build input:
    /// the project root, pages, public assets, templates, the data file or
    /// the config file. Paths are compared after resolving `.` and `..`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let output = normalize_path(&self.build.output);
        if normalize_path(&self.root).starts_with(&output) {
            return Err(ConfigError::Validation(format!(
                "[build.output] must not be the project root or one of its parents: {}",
                output.display()
            )));
        }

        let build = &self.build;
        let inputs = [
            ("[build.pages]", &build.pages),
            ("[build.public]", &build.public),
            ("[build.templates]", &build.templates),
            ("[build.data]", &build.data),
            ("the config file", &self.config_path),
        ];
        for (name, input) in inputs {
            if input.as_os_str().is_empty() {
                continue;
            }
            let input = normalize_path(input);
            if input.starts_with(&output) || output.starts_with(&input) {
                return Err(ConfigError::Validation(format!(
                    "[build.output] overlaps {name}: {}",
                    output.display()
                )));
            }
        }

        if (build.sitemap.enable || build.rss.enable) && self.site.url.is_none() {
            return Err(ConfigError::Validation(
                "[site.url] is required when sitemap or rss is enabled".into(),
            ));
        }
        Ok(())
    }
}
