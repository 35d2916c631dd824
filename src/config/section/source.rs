//! `[source]` section configuration.
//!
//! ```toml
//! [source]
//! entries = ["style/index.styl"]   # Files fed into the pipeline, in order
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::config::util::resolve_against;
use crate::config::{ConfigDiagnostics, FieldPath};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Style-language entry files, relative to the project root.
    pub entries: Vec<PathBuf>,
}

pub struct SourceConfigFields {
    pub entries: FieldPath,
}

impl SourceConfig {
    pub const FIELDS: SourceConfigFields = SourceConfigFields {
        entries: FieldPath::new("source.entries"),
    };

    pub(crate) fn normalize(&mut self, root: &Path) {
        self.entries = self
            .entries
            .iter()
            .map(|p| resolve_against(p, root))
            .collect();
    }

    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.entries.is_empty() {
            diag.error_with_hint(
                Self::FIELDS.entries,
                "no entry files configured",
                "add a stylesheet, e.g. entries = [\"style/index.styl\"]",
            );
        }
        for entry in &self.entries {
            if !entry.is_file() {
                diag.error(
                    Self::FIELDS.entries,
                    format!("entry `{}` does not exist", entry.display()),
                );
            }
        }
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            entries: vec![PathBuf::from("style/index.styl")],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_parse_config;

    #[test]
    fn test_source_defaults() {
        let config = test_parse_config("");
        assert_eq!(config.source.entries, vec![PathBuf::from("style/index.styl")]);
    }

    #[test]
    fn test_source_entries() {
        let config = test_parse_config("[source]\nentries = [\"a.styl\", \"b.styl\"]");
        assert_eq!(config.source.entries.len(), 2);
    }

    #[test]
    fn test_validate_missing_entry() {
        let mut diag = ConfigDiagnostics::new();
        SourceConfig {
            entries: vec![PathBuf::from("/no/such/index.styl")],
        }
        .validate(&mut diag);
        assert_eq!(diag.len(), 1);

        let mut diag = ConfigDiagnostics::new();
        SourceConfig { entries: vec![] }.validate(&mut diag);
        assert!(diag.errors()[0].hint.is_some());
    }
}
