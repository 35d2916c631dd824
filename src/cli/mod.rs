//! Command-line interface module.

mod args;
pub mod build;
pub mod init;

pub use args::{BuildArgs, Cli, Commands};
