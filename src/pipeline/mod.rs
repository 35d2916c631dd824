//! Linear stylesheet build pipeline.
//!
//! ```text
//! sources -> [Compile] -> [Minify] -> [Concat] -> destination/
//! ```
//!
//! Sources are read once, folded through the stages in order, and the
//! remaining chunks are written only after every stage succeeded. Each
//! artifact goes to a temporary file next to its target and is renamed
//! over it, so a target is either fully replaced or left untouched.
//! Two chunks may not share a target name.

mod error;
mod stage;

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;

use rustc_hash::FxHashSet;
use tempfile::NamedTempFile;

pub use error::BuildError;
pub use stage::{ConcatOptions, MinifyOptions, Stage};

/// A named buffer flowing between stages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub path: PathBuf,
    pub contents: Vec<u8>,
}

/// One written output file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub path: PathBuf,
    pub size: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildReport {
    pub artifacts: Vec<Artifact>,
}

impl BuildReport {
    pub fn total_size(&self) -> usize {
        self.artifacts.iter().map(|a| a.size).sum()
    }
}

/// Ordered stages plus the directory artifacts are written to.
#[derive(Debug, Clone)]
pub struct Pipeline {
    stages: Vec<Stage>,
    destination: PathBuf,
}

impl Pipeline {
    pub fn new(destination: impl Into<PathBuf>) -> Self {
        Self {
            stages: Vec::new(),
            destination: destination.into(),
        }
    }

    /// Append a stage.
    pub fn pipe(mut self, stage: Stage) -> Self {
        self.stages.push(stage);
        self
    }

    /// Run every stage over `sources` and write the results.
    pub fn run(&self, sources: &[PathBuf]) -> Result<BuildReport, BuildError> {
        if self.stages.is_empty() {
            return Err(BuildError::EmptyPipeline);
        }
        if sources.is_empty() {
            return Err(BuildError::NoSources);
        }

        let mut chunks = sources
            .iter()
            .map(|path| {
                let contents = fs::read(path).map_err(|e| BuildError::io(path, e))?;
                Ok(Chunk {
                    path: path.clone(),
                    contents,
                })
            })
            .collect::<Result<Vec<_>, BuildError>>()?;

        for stage in &self.stages {
            let start = Instant::now();
            chunks = stage.apply(chunks)?;
            crate::debug!("pipeline"; "{} took {:.2?}", stage.name(), start.elapsed());
        }

        write_all(&self.destination, chunks)
    }
}

/// Run `stages` over `sources` and write the results to `destination`.
pub fn run(sources: &[PathBuf], stages: Vec<Stage>, destination: &Path) -> Result<BuildReport, BuildError> {
    let pipeline = stages
        .into_iter()
        .fold(Pipeline::new(destination), Pipeline::pipe);
    pipeline.run(sources)
}

/// Stage every chunk in a temp file first, then rename them all into place.
fn write_all(destination: &Path, chunks: Vec<Chunk>) -> Result<BuildReport, BuildError> {
    let mut targets = Vec::with_capacity(chunks.len());
    let mut seen = FxHashSet::default();
    for chunk in &chunks {
        let Some(name) = chunk.path.file_name() else {
            return Err(BuildError::io(
                &chunk.path,
                std::io::Error::new(std::io::ErrorKind::InvalidInput, "chunk has no file name"),
            ));
        };
        let target = destination.join(name);
        if !seen.insert(target.clone()) {
            return Err(BuildError::DuplicateOutput { path: target });
        }
        targets.push(target);
    }

    let mut staged = Vec::with_capacity(chunks.len());
    for (chunk, target) in chunks.into_iter().zip(targets) {
        let mut file = NamedTempFile::new_in(destination).map_err(|e| BuildError::io(destination, e))?;
        file.write_all(&chunk.contents)
            .and_then(|()| file.flush())
            .map_err(|e| BuildError::io(file.path(), e))?;
        staged.push((file, target, chunk.contents.len()));
    }

    let mut report = BuildReport::default();
    for (file, target, size) in staged {
        file.persist(&target)
            .map_err(|e| BuildError::io(&target, e.error))?;
        report.artifacts.push(Artifact { path: target, size });
    }
    Ok(report)
}
