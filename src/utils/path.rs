//! Path normalization for paths that may not exist yet.

use std::path::{Component, Path, PathBuf};

/// Absolute form of `path` with `.` and `..` resolved.
///
/// The longest existing ancestor is canonicalized (resolving symlinks), the
/// rest is appended lexically. Relative paths are taken from the cwd.
pub fn normalize_path(path: &Path) -> PathBuf {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir().map_or_else(|_| path.to_path_buf(), |cwd| cwd.join(path))
    };
    let cleaned = clean(&absolute);

    let mut existing = cleaned.as_path();
    loop {
        if let Ok(canonical) = existing.canonicalize() {
            return match cleaned.strip_prefix(existing) {
                Ok(rest) if !rest.as_os_str().is_empty() => canonical.join(rest),
                _ => canonical,
            };
        }
        match existing.parent() {
            Some(parent) => existing = parent,
            None => return cleaned,
        }
    }
}

/// Resolve `.` and `..` without touching the filesystem.
fn clean(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_clean_parent_components() {
        assert_eq!(clean(Path::new("/a/b/../c/./d")), PathBuf::from("/a/c/d"));
        assert_eq!(clean(Path::new("/a/../..")), PathBuf::from("/"));
    }

    #[test]
    fn test_missing_tail_is_appended() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().canonicalize().unwrap();
        let normalized = normalize_path(&dir.path().join("dist/../dist/css"));
        assert_eq!(normalized, root.join("dist/css"));
    }

    #[test]
    fn test_relative_becomes_absolute() {
        assert!(normalize_path(Path::new("some/relative/path")).is_absolute());
    }
}
