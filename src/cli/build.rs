//! Build command.
//!
//! Runs the configured pipeline once and reports what was written.

use crate::{
    config::PipelineConfig,
    log,
    pipeline::{self, BuildReport},
    utils::plural_count,
};
use anyhow::Result;
use std::time::Instant;

/// Build the bundle described by `config`.
pub fn build(config: &PipelineConfig) -> Result<BuildReport> {
    let start = Instant::now();
    let stages = config.stages();
    let sources = config.sources();

    crate::debug!(
        "build";
        "{} through {} into {}",
        plural_count(sources.len(), "source"),
        stages.iter().map(|s| s.name()).collect::<Vec<_>>().join(" -> "),
        config.output.dir.display()
    );

    let report = pipeline::run(sources, stages, &config.output.dir)?;

    for artifact in &report.artifacts {
        let shown = artifact
            .path
            .strip_prefix(&config.root)
            .unwrap_or(&artifact.path);
        log!("build"; "wrote {} ({})", shown.display(), plural_count(artifact.size, "byte"));
    }
    log!(
        "build";
        "done in {:.2?}, {} total",
        start.elapsed(),
        plural_count(report.total_size(), "byte")
    );

    Ok(report)
}
