//! stylepipe - compile, minify and bundle Stylus-like stylesheets.

mod cli;
mod compiler;
mod config;
mod logger;
mod minify;
mod pipeline;
mod utils;

use anyhow::{Context, Result};
use clap::{ColorChoice, Parser};
use cli::{Cli, Commands};
use config::PipelineConfig;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }
    logger::set_verbose(cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            logger::error(&err);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    match &cli.command {
        Some(Commands::Init { force, dry }) => {
            let cwd = std::env::current_dir().context("Failed to get current working directory")?;
            cli::init::init(&cwd, *force, *dry)
        }
        Some(Commands::Build { .. }) | None => {
            let config = PipelineConfig::load(cli)?;
            cli::build::build(&config).map(|_| ())
        }
    }
}
