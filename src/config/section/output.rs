//! `[output]` section configuration.
//!
//! ```toml
//! [output]
//! dir = "."                # Destination directory, must exist
//! filename = "style.css"   # Name of the bundle
//! separator = ""           # Inserted between concatenated sources
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::config::util::resolve_against;
use crate::config::{ConfigDiagnostics, FieldPath};
use crate::pipeline::ConcatOptions;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: PathBuf,
    pub filename: String,
    pub separator: String,
}

pub struct OutputConfigFields {
    pub dir: FieldPath,
    pub filename: FieldPath,
}

impl OutputConfig {
    pub const FIELDS: OutputConfigFields = OutputConfigFields {
        dir: FieldPath::new("output.dir"),
        filename: FieldPath::new("output.filename"),
    };

    pub(crate) fn normalize(&mut self, root: &Path) {
        self.dir = resolve_against(&self.dir, root);
    }

    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        let bare = Path::new(&self.filename)
            .file_name()
            .is_some_and(|name| name == self.filename.as_str());
        if !bare {
            diag.error_with_hint(
                Self::FIELDS.filename,
                format!("`{}` is not a bare file name", self.filename),
                "put the directory in output.dir",
            );
        }

        if !self.dir.is_dir() {
            diag.error_with_hint(
                Self::FIELDS.dir,
                format!("output directory `{}` does not exist", self.dir.display()),
                "create it first, the build does not create directories",
            );
        }
    }

    pub fn options(&self) -> ConcatOptions {
        ConcatOptions {
            filename: self.filename.clone(),
            separator: self.separator.clone(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        let defaults = ConcatOptions::default();
        Self {
            dir: PathBuf::from("."),
            filename: defaults.filename,
            separator: defaults.separator,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_parse_config;
    use tempfile::TempDir;

    #[test]
    fn test_output_defaults() {
        let config = test_parse_config("");
        assert_eq!(config.output.dir, PathBuf::from("."));
        assert_eq!(config.output.filename, "style.css");
        assert_eq!(config.output.separator, "");
    }

    #[test]
    fn test_validate_filename() {
        let dir = TempDir::new().unwrap();
        for (filename, ok) in [("style.css", true), ("css/style.css", false), ("", false)] {
            let output = OutputConfig {
                dir: dir.path().to_path_buf(),
                filename: filename.to_string(),
                separator: String::new(),
            };
            let mut diag = ConfigDiagnostics::new();
            output.validate(&mut diag);
            assert_eq!(diag.is_empty(), ok, "filename {filename:?}");
        }
    }

    #[test]
    fn test_validate_missing_dir() {
        let output = OutputConfig {
            dir: PathBuf::from("/no/such/dir"),
            ..OutputConfig::default()
        };
        let mut diag = ConfigDiagnostics::new();
        output.validate(&mut diag);
        assert_eq!(diag.errors()[0].field, OutputConfig::FIELDS.dir);
    }
}
