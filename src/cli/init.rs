//! Project initialization.
//!
//! Writes a commented `stylepipe.toml` holding every default.

use anyhow::{Context, Result, bail};
use std::{fs, path::Path};

use crate::config::CONFIG_FILE;
use crate::log;

/// Generate stylepipe.toml content with comments
pub fn config_template() -> String {
    format!(
        r#"# stylepipe configuration file (v{version})

[source]
# Entry stylesheets, compiled and bundled in this order
entries = ["style/index.styl"]

[compile]
# Helper sets available to every stylesheet
use = ["nib"]
# Compact compiler output
compress = true
# Inline imported .css files instead of leaving an @import
include_css = true
# Extra directories searched by @import and @require
paths = []

[minify]
enable = true
# Special /*! comments to keep: 0 none, 1 first, 2 or "*" all
keep_special_comments = 0

[output]
# Destination directory, must already exist
dir = "."
filename = "style.css"
# Inserted between bundled stylesheets
separator = ""
"#,
        version = env!("CARGO_PKG_VERSION")
    )
}

/// Write the template into `root`, or print it when `dry`.
pub fn init(root: &Path, force: bool, dry: bool) -> Result<()> {
    if dry {
        print!("{}", config_template());
        return Ok(());
    }

    let path = root.join(CONFIG_FILE);
    if path.exists() && !force {
        bail!(
            "'{}' already exists.\n\
             Use `stylepipe init --force` to overwrite it.",
            path.display()
        );
    }

    fs::write(&path, config_template())
        .with_context(|| format!("Failed to write config file '{}'", path.display()))?;

    log!("init"; "wrote {}", CONFIG_FILE);
    Ok(())
}
