//! `[compile]` section configuration.
//!
//! ```toml
//! [compile]
//! use = ["nib"]          # Helper sets
//! compress = true        # Compact output
//! include_css = true     # Inline imported .css files
//! paths = []             # Extra import search directories
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::compiler::{CompileOptions, HelperSet};
use crate::config::util::resolve_against;
use crate::config::{ConfigDiagnostics, FieldPath};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompileConfig {
    #[serde(rename = "use")]
    pub helpers: Vec<HelperSet>,

    pub compress: bool,

    /// Also accepted as `"include css"`.
    #[serde(alias = "include css")]
    pub include_css: bool,

    /// Import search directories, `~` expanded.
    pub paths: Vec<PathBuf>,
}

pub struct CompileConfigFields {
    pub paths: FieldPath,
}

impl CompileConfig {
    pub const FIELDS: CompileConfigFields = CompileConfigFields {
        paths: FieldPath::new("compile.paths"),
    };

    pub(crate) fn normalize(&mut self, root: &Path) {
        self.paths = self
            .paths
            .iter()
            .map(|p| resolve_against(p, root))
            .collect();
    }

    /// Missing search directories only warn; imports report what they cannot find.
    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        for path in &self.paths {
            if !path.is_dir() {
                diag.warn(
                    Self::FIELDS.paths,
                    format!("`{}` is not a directory", path.display()),
                );
            }
        }
    }

    pub fn options(&self) -> CompileOptions {
        CompileOptions {
            helpers: self.helpers.clone(),
            compress: self.compress,
            include_css: self.include_css,
            paths: self.paths.clone(),
        }
    }
}

impl Default for CompileConfig {
    fn default() -> Self {
        let defaults = CompileOptions::default();
        Self {
            helpers: defaults.helpers,
            compress: defaults.compress,
            include_css: defaults.include_css,
            paths: defaults.paths,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_parse_config;

    #[test]
    fn test_compile_defaults() {
        let config = test_parse_config("");
        assert_eq!(config.compile.helpers, vec![HelperSet::Nib]);
        assert!(config.compile.compress);
        assert!(config.compile.include_css);
        assert!(config.compile.paths.is_empty());
    }

    #[test]
    fn test_compile_overrides() {
        let config =
            test_parse_config("[compile]\nuse = []\ncompress = false\npaths = [\"vendor/styl\"]");
        assert!(config.compile.helpers.is_empty());
        assert!(!config.compile.compress);
        assert_eq!(config.compile.paths, vec![PathBuf::from("vendor/styl")]);
    }

    #[test]
    fn test_include_css_alias() {
        let config = test_parse_config("[compile]\n\"include css\" = false");
        assert!(!config.compile.include_css);
    }

    #[test]
    fn test_unknown_helper_rejected() {
        let result: Result<crate::config::PipelineConfig, _> =
            toml::from_str("[compile]\nuse = [\"bootstrap\"]");
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_search_path_warns() {
        let config = CompileConfig {
            paths: vec![PathBuf::from("/no/such/dir")],
            ..CompileConfig::default()
        };
        let mut diag = ConfigDiagnostics::new();
        config.validate(&mut diag);
        assert!(diag.is_empty());
        assert_eq!(diag.warnings().len(), 1);
    }
}
