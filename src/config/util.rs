//! Configuration utility functions.

use std::path::{Path, PathBuf};

/// Find config file by searching upward from `start`
///
/// Walks up parent directories until finding `config_name`.
/// An absolute `config_name` is returned as-is when it exists.
///
/// # Example
/// ```text
/// /home/user/site/style/      ← start
/// /home/user/site/stylepipe.toml  ← found!
/// ```
pub fn find_config_file(start: &Path, config_name: &Path) -> Option<PathBuf> {
    if config_name.is_absolute() {
        return config_name.exists().then(|| config_name.to_path_buf());
    }

    let mut current = start;
    loop {
        let candidate = current.join(config_name);
        if candidate.exists() {
            return Some(candidate);
        }

        match current.parent() {
            Some(parent) => current = parent,
            None => return None,
        }
    }
}

/// Expand `~` and resolve `path` against `root`.
pub fn resolve_against(path: &Path, root: &Path) -> PathBuf {
    let expanded = shellexpand::tilde(&path.to_string_lossy()).into_owned();
    let path = PathBuf::from(expanded);
    let full_path = if path.is_relative() {
        root.join(&path)
    } else {
        path
    };
    crate::utils::path::normalize_path(&full_path)
}

// ============================================================================
// tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_find_config_walks_upward() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("style/partials");
        fs::create_dir_all(&nested).unwrap();
        fs::write(dir.path().join("stylepipe.toml"), "").unwrap();

        let found = find_config_file(&nested, Path::new("stylepipe.toml")).unwrap();
        assert_eq!(found, dir.path().join("stylepipe.toml"));
    }

    #[test]
    fn test_find_config_absolute() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("custom.toml");
        assert_eq!(find_config_file(dir.path(), &path), None);

        fs::write(&path, "").unwrap();
        assert_eq!(find_config_file(Path::new("/"), &path), Some(path));
    }

    #[test]
    fn test_resolve_against_root() {
        let resolved = resolve_against(Path::new("lib/mixins"), Path::new("/project"));
        assert_eq!(resolved, PathBuf::from("/project/lib/mixins"));

        let absolute = resolve_against(Path::new("/opt/styl"), Path::new("/project"));
        assert_eq!(absolute, PathBuf::from("/opt/styl"));
    }

    #[test]
    fn test_resolve_expands_tilde() {
        let resolved = resolve_against(Path::new("~/styl"), Path::new("/project"));
        assert!(!resolved.to_string_lossy().contains('~'));
        assert!(resolved.is_absolute());
    }
}
