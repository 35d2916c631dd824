//! Configuration section definitions.
//!
//! Each module corresponds to a section in `stylepipe.toml`:
//!
//! | Module    | TOML Section | Purpose                              |
//! |-----------|--------------|--------------------------------------|
//! | `source`  | `[source]`   | Entry stylesheets                    |
//! | `compile` | `[compile]`  | Style-language compiler settings     |
//! | `minify`  | `[minify]`   | Minifier and comment retention       |
//! | `output`  | `[output]`   | Destination directory and bundle     |

mod compile;
mod minify;
mod output;
mod source;

pub use compile::CompileConfig;
pub use minify::MinifyConfig;
pub use output::OutputConfig;
pub use source::SourceConfig;
