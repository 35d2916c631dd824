//! Transformation stages.
//!
//! Each stage is a pure function of its input chunks and its options.

use std::path::{Path, PathBuf};

use super::{BuildError, Chunk};
use crate::compiler::{self, CompileError, CompileOptions};
use crate::minify::{self, MinifyError, SpecialComments};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MinifyOptions {
    pub keep_special_comments: SpecialComments,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConcatOptions {
    /// File name of the single output chunk.
    pub filename: String,
    /// Inserted between consecutive chunks.
    pub separator: String,
}

impl Default for ConcatOptions {
    fn default() -> Self {
        Self {
            filename: "style.css".to_string(),
            separator: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stage {
    /// Style language to CSS; renames chunks to `.css`.
    Compile(CompileOptions),
    Minify(MinifyOptions),
    /// Join all chunks into one named chunk.
    Concat(ConcatOptions),
}

impl Stage {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Compile(_) => "compile",
            Self::Minify(_) => "minify",
            Self::Concat(_) => "concat",
        }
    }

    pub fn apply(&self, chunks: Vec<Chunk>) -> Result<Vec<Chunk>, BuildError> {
        match self {
            Self::Compile(options) => chunks
                .into_iter()
                .map(|chunk| compile_chunk(chunk, options))
                .collect(),
            Self::Minify(options) => chunks
                .into_iter()
                .map(|chunk| minify_chunk(chunk, options.keep_special_comments))
                .collect(),
            Self::Concat(options) => Ok(vec![concat(chunks, options)]),
        }
    }
}

fn compile_chunk(chunk: Chunk, options: &CompileOptions) -> Result<Chunk, BuildError> {
    let Ok(source) = std::str::from_utf8(&chunk.contents) else {
        return Err(CompileError::new(&chunk.path, 0, "source is not valid UTF-8").into());
    };
    let css = compiler::compile(source, &chunk.path, options)?;
    Ok(Chunk {
        path: chunk.path.with_extension("css"),
        contents: css.into_bytes(),
    })
}

fn minify_chunk(chunk: Chunk, keep: SpecialComments) -> Result<Chunk, BuildError> {
    let name = display_name(&chunk.path);
    let Ok(css) = std::str::from_utf8(&chunk.contents) else {
        return Err(MinifyError {
            name,
            line: 0,
            column: 0,
            message: "stylesheet is not valid UTF-8".to_string(),
        }
        .into());
    };
    let minified = minify::minify(css, &name, keep)?;
    Ok(Chunk {
        path: chunk.path,
        contents: minified.into_bytes(),
    })
}

fn concat(chunks: Vec<Chunk>, options: &ConcatOptions) -> Chunk {
    let mut contents = Vec::new();
    for (i, chunk) in chunks.into_iter().enumerate() {
        if i > 0 {
            contents.extend_from_slice(options.separator.as_bytes());
        }
        contents.extend(chunk.contents);
    }
    Chunk {
        path: PathBuf::from(&options.filename),
        contents,
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned())
}
