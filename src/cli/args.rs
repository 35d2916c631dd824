//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::path::PathBuf;

use crate::minify::SpecialComments;

/// Stylesheet pipeline: compile, minify and bundle into one CSS file
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Config file path (default: stylepipe.toml, searched upward)
    #[arg(short = 'C', long, global = true, value_hint = clap::ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Enable verbose output for debugging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// subcommands (default: build)
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Run the pipeline and write the bundle
    #[command(visible_alias = "b")]
    Build {
        #[command(flatten)]
        args: BuildArgs,
    },

    /// Write a commented stylepipe.toml into the current directory
    #[command(visible_alias = "i")]
    Init {
        /// Overwrite an existing config file
        #[arg(short, long)]
        force: bool,

        /// Print the template to stdout instead of writing it
        #[arg(long)]
        dry: bool,
    },
}

/// Build arguments. Each one overrides its config field when given.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct BuildArgs {
    /// Entry stylesheets, replacing `source.entries`
    #[arg(value_name = "INPUT", value_hint = clap::ValueHint::FilePath)]
    pub inputs: Vec<PathBuf>,

    /// Output directory (must exist)
    #[arg(short, long, value_hint = clap::ValueHint::DirPath)]
    pub output: Option<PathBuf>,

    /// Bundle file name
    #[arg(short, long)]
    pub filename: Option<String>,

    /// Emit compact CSS from the compiler
    #[arg(long, action = clap::ArgAction::Set, num_args = 0..=1, default_missing_value = "true", require_equals = false)]
    pub compress: Option<bool>,

    /// Inline imported .css files
    #[arg(long = "include-css", action = clap::ArgAction::Set, num_args = 0..=1, default_missing_value = "true", require_equals = false)]
    pub include_css: Option<bool>,

    /// Run the minify stage
    #[arg(short, long, action = clap::ArgAction::Set, num_args = 0..=1, default_missing_value = "true", require_equals = false)]
    pub minify: Option<bool>,

    /// Special comments to keep when minifying (0, 1, or 2 / "*")
    #[arg(short, long = "keep-special-comments", value_name = "POLICY")]
    pub keep_special_comments: Option<SpecialComments>,
}

impl Cli {
    /// Build arguments of the `build` subcommand, if that is what runs.
    pub fn build_args(&self) -> Option<&BuildArgs> {
        match &self.command {
            Some(Commands::Build { args }) => Some(args),
            _ => None,
        }
    }
}
