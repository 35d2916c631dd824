//! Build error types.

use std::path::PathBuf;

use thiserror::Error;

use crate::compiler::CompileError;
use crate::minify::MinifyError;

/// Any failure of a pipeline run. Every variant aborts the run.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("compilation failed")]
    Compile(#[from] CompileError),

    #[error("minification failed")]
    Minify(#[from] MinifyError),

    #[error("IO error at `{path}`")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("more than one chunk would be written to `{path}`")]
    DuplicateOutput { path: PathBuf },

    #[error("pipeline has no stages")]
    EmptyPipeline,

    #[error("no source files given")]
    NoSources,
}

impl BuildError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Error, ErrorKind};

    #[test]
    fn test_display() {
        let err = BuildError::from(CompileError::new("index.styl", 2, "undefined mixin `x`"));
        assert_eq!(err.to_string(), "compilation failed");
        let cause = std::error::Error::source(&err).map(ToString::to_string);
        assert_eq!(cause.as_deref(), Some("index.styl:2: undefined mixin `x`"));

        let err = BuildError::io("out/style.css", Error::new(ErrorKind::NotFound, "missing"));
        assert_eq!(err.to_string(), "IO error at `out/style.css`");
        assert!(std::error::Error::source(&err).is_some());
    }
}
