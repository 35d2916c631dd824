//! Compilation error types.

use std::fmt;
use std::path::{Path, PathBuf};

/// Error raised while turning style-language source into CSS.
///
/// `line` is 1-based; `0` means the location is unknown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileError {
    pub path: PathBuf,
    pub line: usize,
    pub message: String,
}

impl CompileError {
    pub fn new(path: impl Into<PathBuf>, line: usize, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            line,
            message: message.into(),
        }
    }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.line > 0 {
            write!(f, "{}:{}: {}", self.path.display(), self.line, self.message)
        } else {
            write!(f, "{}: {}", self.path.display(), self.message)
        }
    }
}

impl std::error::Error for CompileError {}

/// Source-level error produced by the lexer and parser.
///
/// Carries no file path; callers attach one with [`SyntaxError::in_file`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxError {
    pub line: usize,
    pub message: String,
}

impl SyntaxError {
    pub fn new(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
        }
    }

    pub fn in_file(self, path: &Path) -> CompileError {
        CompileError::new(path, self.line, self.message)
    }
}
