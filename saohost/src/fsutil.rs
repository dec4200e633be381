//! Filesystem helpers for generated outputs.

use std::io;
use std::path::{Path, PathBuf};

use crate::core::SaoHostError;

/// Behaviour switches for [`remove_path`], modelled on `rm`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RemoveOptions {
    /// Allow removing directories and their contents.
    pub recursive: bool,
    /// Ignore missing paths and suppress every other error.
    pub force: bool,
    /// Treat the path as a glob pattern.
    pub use_glob: bool,
}

impl RemoveOptions {
    /// `rm -rf`
    pub fn recursive_force() -> Self {
        Self {
            recursive: true,
            force: true,
            use_glob: false,
        }
    }
}

/// Remove a file, symlink or directory (or every glob match).
///
/// Returns the paths that were actually removed.
pub fn remove_path(path: &Path, options: RemoveOptions) -> Result<Vec<PathBuf>, SaoHostError> {
    let targets = if options.use_glob {
        match expand_glob(path) {
            Ok(paths) => paths,
            Err(e) if options.force => {
                tracing::warn!("Ignoring glob error for {}: {}", path.display(), e);
                return Ok(Vec::new());
            }
            Err(e) => return Err(e),
        }
    } else {
        vec![path.to_path_buf()]
    };

    let mut removed = Vec::new();
    for target in targets {
        match remove_one(&target, options.recursive) {
            Ok(()) => {
                tracing::debug!("Removed {}", target.display());
                removed.push(target);
            }
            Err(e) if options.force => {
                if !matches!(e, SaoHostError::NotFound(_)) {
                    tracing::warn!("Ignoring failure to remove {}: {}", target.display(), e);
                }
            }
            Err(e) => return Err(e),
        }
    }
    Ok(removed)
}

fn expand_glob(pattern: &Path) -> Result<Vec<PathBuf>, SaoHostError> {
    let pattern = pattern.to_string_lossy();
    let paths = glob::glob(&pattern).map_err(|e| SaoHostError::Glob(e.to_string()))?;
    paths
        .map(|entry| entry.map_err(|e| SaoHostError::Glob(e.to_string())))
        .collect()
}

fn remove_one(path: &Path, recursive: bool) -> Result<(), SaoHostError> {
    let meta = match std::fs::symlink_metadata(path) {
        Ok(meta) => meta,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(SaoHostError::NotFound(path.to_path_buf()))
        }
        Err(e) => return Err(e.into()),
    };
    let file_type = meta.file_type();
    if file_type.is_symlink() || file_type.is_file() {
        std::fs::remove_file(path)?;
    } else if file_type.is_dir() {
        if !recursive {
            return Err(SaoHostError::IsDirectory(path.to_path_buf()));
        }
        std::fs::remove_dir_all(path)?;
    } else {
        return Err(SaoHostError::Io(io::Error::new(
            io::ErrorKind::Other,
            format!("Unknown file type: '{}'", path.display()),
        )));
    }
    Ok(())
}

/// Create the parent directories of `path`.
pub fn ensure_parent_dir(path: &Path) -> Result<(), SaoHostError> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => ensure_dir(parent),
        _ => Ok(()),
    }
}

pub fn ensure_dir(dir: &Path) -> Result<(), SaoHostError> {
    if !dir.is_dir() {
        tracing::debug!("Creating {}", dir.display());
        std::fs::create_dir_all(dir)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_remove_file() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("a.txt");
        std::fs::write(&file, "x").unwrap();
        let removed = remove_path(&file, RemoveOptions::default()).unwrap();
        assert_eq!(removed, vec![file.clone()]);
        assert!(!file.exists());
    }

    #[test]
    fn test_directory_needs_recursive() {
        let dir = TempDir::new().unwrap();
        let sub = dir.path().join("sub");
        std::fs::create_dir(&sub).unwrap();
        let err = remove_path(&sub, RemoveOptions::default()).unwrap_err();
        assert!(matches!(err, SaoHostError::IsDirectory(_)));
        assert!(sub.exists());

        let options = RemoveOptions {
            recursive: true,
            ..RemoveOptions::default()
        };
        remove_path(&sub, options).unwrap();
        assert!(!sub.exists());
    }

    #[test]
    fn test_missing_path() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope");
        let err = remove_path(&missing, RemoveOptions::default()).unwrap_err();
        assert!(matches!(err, SaoHostError::NotFound(_)));

        let removed = remove_path(&missing, RemoveOptions::recursive_force()).unwrap();
        assert!(removed.is_empty());
    }

    #[test]
    fn test_force_suppresses_directory_error() {
        let dir = TempDir::new().unwrap();
        let sub = dir.path().join("keep");
        std::fs::create_dir(&sub).unwrap();
        let options = RemoveOptions {
            force: true,
            ..RemoveOptions::default()
        };
        assert!(remove_path(&sub, options).unwrap().is_empty());
        assert!(sub.exists());
    }

    #[test]
    fn test_glob_removes_matches_only() {
        let dir = TempDir::new().unwrap();
        for name in ["a.bak", "b.bak", "c.txt"] {
            std::fs::write(dir.path().join(name), "x").unwrap();
        }
        let options = RemoveOptions {
            use_glob: true,
            ..RemoveOptions::default()
        };
        let removed = remove_path(&dir.path().join("*.bak"), options).unwrap();
        assert_eq!(removed.len(), 2);
        assert!(dir.path().join("c.txt").exists());
        assert!(!dir.path().join("a.bak").exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_removed_not_target() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("target");
        std::fs::create_dir(&target).unwrap();
        std::fs::write(target.join("keep.txt"), "x").unwrap();
        let link = dir.path().join("link");
        std::os::unix::fs::symlink(&target, &link).unwrap();

        remove_path(&link, RemoveOptions::default()).unwrap();
        assert!(!link.exists());
        assert!(target.join("keep.txt").exists());
    }

    #[test]
    fn test_ensure_parent_dir() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("a").join("b").join("c.png");
        ensure_parent_dir(&file).unwrap();
        assert!(dir.path().join("a").join("b").is_dir());
        ensure_parent_dir(Path::new("bare.png")).unwrap();
    }
}
