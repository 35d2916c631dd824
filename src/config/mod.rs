//! Project configuration for `stylepipe.toml`.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── section/       # Configuration section definitions
//! │   ├── source     # [source]
//! │   ├── compile    # [compile]
//! │   ├── minify     # [minify]
//! │   └── output     # [output]
//! ├── types/         # FieldPath, ConfigError, ConfigDiagnostics
//! ├── util.rs        # Config discovery, path resolution
//! └── mod.rs         # PipelineConfig (this file)
//! ```
//!
//! The config file is optional. Without one, defaults apply with the
//! working directory as project root. Command-line flags override both.

pub mod section;
pub mod types;
mod util;

pub use section::{CompileConfig, MinifyConfig, OutputConfig, SourceConfig};
pub use types::{ConfigDiagnostics, ConfigError, FieldPath};

use util::{find_config_file, resolve_against};

use crate::cli::{BuildArgs, Cli};
use crate::log;
use crate::pipeline::Stage;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Default config file name, searched upward from the working directory.
pub const CONFIG_FILE: &str = "stylepipe.toml";

// ============================================================================
// root configuration
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Config file in use, empty when running on defaults.
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Relative paths in the file resolve against this directory.
    #[serde(skip)]
    pub root: PathBuf,

    #[serde(default)]
    pub source: SourceConfig,

    #[serde(default)]
    pub compile: CompileConfig,

    #[serde(default)]
    pub minify: MinifyConfig,

    #[serde(default)]
    pub output: OutputConfig,
}

impl PipelineConfig {
    /// Load configuration for a build, applying CLI overrides and validating.
    pub fn load(cli: &Cli) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current working directory")?;

        let config_path = match &cli.config {
            Some(explicit) => {
                let path = resolve_against(explicit, &cwd);
                if !path.is_file() {
                    return Err(ConfigError::NotFound(path).into());
                }
                Some(path)
            }
            None => find_config_file(&cwd, Path::new(CONFIG_FILE)),
        };

        let mut config = match &config_path {
            Some(path) => {
                crate::debug!("config"; "using {}", path.display());
                let mut config = Self::from_path(path)?;
                config.config_path = path.clone();
                config
            }
            None => {
                crate::debug!("config"; "no {} found, using defaults", CONFIG_FILE);
                Self::default()
            }
        };

        let root = config
            .config_path
            .parent()
            .map_or_else(|| cwd.clone(), Path::to_path_buf);
        config.normalize_paths(&root);

        if let Some(args) = cli.build_args() {
            config.apply_build_args(args, &cwd);
        }

        config.validate()?;
        Ok(config)
    }

    /// Parse a config file, warning about fields it does not know.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (config, ignored) = Self::parse_with_ignored(&content)?;
        if !ignored.is_empty() {
            let name = path
                .file_name()
                .map_or_else(|| path.to_string_lossy(), |n| n.to_string_lossy());
            for field in &ignored {
                log!("warn"; "unknown field `{}` in {}, ignoring", field, name);
            }
        }

        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>), ConfigError> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })?;
        Ok((config, ignored))
    }

    // ========================================================================
    // cli configuration updates
    // ========================================================================

    /// Apply build arguments. Paths given on the command line are relative to `cwd`.
    fn apply_build_args(&mut self, args: &BuildArgs, cwd: &Path) {
        if !args.inputs.is_empty() {
            self.source.entries = args
                .inputs
                .iter()
                .map(|p| resolve_against(p, cwd))
                .collect();
        }
        if let Some(dir) = &args.output {
            self.output.dir = resolve_against(dir, cwd);
        }

        Self::update_option(&mut self.output.filename, args.filename.as_ref());
        Self::update_option(&mut self.compile.compress, args.compress.as_ref());
        Self::update_option(&mut self.compile.include_css, args.include_css.as_ref());
        Self::update_option(&mut self.minify.enable, args.minify.as_ref());
        Self::update_option(
            &mut self.minify.keep_special_comments,
            args.keep_special_comments.as_ref(),
        );
    }

    /// Update config option if CLI value is provided.
    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }

    // ========================================================================
    // path normalization
    // ========================================================================

    fn normalize_paths(&mut self, root: &Path) {
        let root = crate::utils::path::normalize_path(root);
        self.source.normalize(&root);
        self.compile.normalize(&root);
        self.output.normalize(&root);
        self.root = root;
    }

    // ========================================================================
    // validation
    // ========================================================================

    /// Validate every section, reporting all errors at once.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut diag = ConfigDiagnostics::new();

        self.source.validate(&mut diag);
        self.compile.validate(&mut diag);
        self.output.validate(&mut diag);

        diag.print_warnings();
        diag.into_result().map_err(ConfigError::Diagnostics)
    }

    // ========================================================================
    // pipeline construction
    // ========================================================================

    /// Compile, then minify when enabled, then concat into the output directory.
    /// Stages in run order. Minify is left out when disabled.
    pub fn stages(&self) -> Vec<Stage> {
        let mut stages = vec![Stage::Compile(self.compile.options())];
        if self.minify.enable {
            stages.push(Stage::Minify(self.minify.options()));
        }
        stages.push(Stage::Concat(self.output.options()));
        stages
    }

    pub fn sources(&self) -> &[PathBuf] {
        &self.source.entries
    }
}

// ============================================================================
// Test Helpers (available to all modules via `use crate::config::test_*`)
// ============================================================================

/// Parse config content.
/// Panics if there are unknown fields (to catch config typos in tests).
#[cfg(test)]
pub fn test_parse_config(content: &str) -> PipelineConfig {
    let (parsed, ignored) = PipelineConfig::parse_with_ignored(content).unwrap();
    assert!(
        ignored.is_empty(),
        "test config has unknown fields: {:?}",
        ignored
    );
    parsed
}
