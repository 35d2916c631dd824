//! Path normalization.

use std::path::{Path, PathBuf};

/// Normalize a file system path to absolute form.
///
/// Tries `canonicalize()` first, so existing paths lose `.`, `..` and
/// symlinks. A path that does not exist yet is returned as-is when
/// absolute, or joined onto the current directory.
///
/// Import cycle detection compares these, so two spellings of the
/// same stylesheet must normalize equal.
#[inline]
pub fn normalize_path(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir().map_or_else(|_| path.to_path_buf(), |cwd| cwd.join(path))
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_normalize_missing_absolute() {
        let path = Path::new("/absolute/path/file.styl");
        assert_eq!(normalize_path(path), PathBuf::from("/absolute/path/file.styl"));
    }

    #[test]
    fn test_normalize_relative() {
        let normalized = normalize_path(Path::new("relative/path/file.styl"));
        assert!(normalized.is_absolute());
    }

    #[test]
    fn test_normalize_dot_segments() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("style")).unwrap();
        std::fs::write(dir.path().join("base.styl"), "").unwrap();

        let direct = normalize_path(&dir.path().join("base.styl"));
        let dotted = normalize_path(&dir.path().join("style/../base.styl"));
        assert_eq!(direct, dotted);
    }
}
