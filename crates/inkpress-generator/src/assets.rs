//! Static asset mirroring.
//!
//! Copies the static directory into the output root byte-for-byte, preserving relative paths.

use std::{
    collections::HashSet,
    fs,
    path::{Path, PathBuf},
};

use thiserror::Error;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Asset processing errors.
#[derive(Debug, Error)]
pub enum AssetError {
    /// IO error on a specific path.
    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Directory traversal error.
    #[error("cannot walk static directory: {0}")]
    Walk(#[from] walkdir::Error),

    /// Invalid asset path.
    #[error("invalid asset path: {0}")]
    InvalidPath(PathBuf),
}

/// Result type for asset operations.
pub type Result<T> = std::result::Result<T, AssetError>;

/// Copies static files into the output directory.
#[derive(Debug, Default)]
pub struct AssetCopier {
    /// Output-relative paths owned by generated pages.
    reserved: HashSet<PathBuf>,
}

impl AssetCopier {
    /// Create a copier with no reserved paths.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Never overwrite these output-relative paths.
    #[must_use]
    pub fn with_reserved(mut self, reserved: impl IntoIterator<Item = PathBuf>) -> Self {
        self.reserved.extend(reserved);
        self
    }

    /// Mirror `source_dir` into `dest_dir`, returning the number of files copied.
    ///
    /// A missing source directory copies nothing.
    pub fn copy(&self, source_dir: &Path, dest_dir: &Path) -> Result<usize> {
        if !source_dir.exists() {
            info!(dir = %source_dir.display(), "static directory does not exist, skipping");
            return Ok(0);
        }

        info!(
            source = %source_dir.display(),
            dest = %dest_dir.display(),
            "copying static assets"
        );

        let mut count = 0;
        let mut walker = WalkDir::new(source_dir).sort_by_file_name().into_iter();
        while let Some(entry) = walker.next() {
            let entry = entry?;
            let relative = entry
                .path()
                .strip_prefix(source_dir)
                .map_err(|_| AssetError::InvalidPath(entry.path().to_path_buf()))?;
            let dest_path = dest_dir.join(relative);

            if entry.file_type().is_dir() {
                if self.reserved.contains(relative) {
                    warn!(
                        path = %relative.display(),
                        "static directory collides with a generated page, keeping the page"
                    );
                    walker.skip_current_dir();
                    continue;
                }
                fs::create_dir_all(&dest_path).map_err(|source| AssetError::Io {
                    path: dest_path.clone(),
                    source,
                })?;
                continue;
            }

            // A file may not sit where a generated page needs a directory.
            if self.reserved.iter().any(|owned| owned.starts_with(relative)) {
                warn!(
                    path = %relative.display(),
                    "static file collides with a generated page, keeping the page"
                );
                continue;
            }

            copy_file(entry.path(), &dest_path)?;
            debug!(src = %entry.path().display(), dest = %dest_path.display(), "copied asset");
            count += 1;
        }

        info!(count, "assets copied");
        Ok(count)
    }
}

/// Copy a single file, creating parent directories.
pub fn copy_file(source: &Path, dest: &Path) -> Result<()> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent).map_err(|e| AssetError::Io {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }
    fs::copy(source, dest).map_err(|e| AssetError::Io {
        path: source.to_path_buf(),
        source: e,
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_copy_assets() {
        let source = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();

        fs::write(source.path().join("style.css"), b"body { color: red; }").unwrap();
        fs::create_dir_all(source.path().join("js/vendor")).unwrap();
        fs::write(source.path().join("js/vendor/lib.js"), b"export {}").unwrap();
        fs::create_dir_all(source.path().join("empty")).unwrap();

        let count = AssetCopier::new().copy(source.path(), dest.path()).unwrap();

        assert_eq!(count, 2);
        assert_eq!(
            fs::read(dest.path().join("style.css")).unwrap(),
            b"body { color: red; }"
        );
        assert!(dest.path().join("js/vendor/lib.js").exists());
        assert!(dest.path().join("empty").is_dir());
    }

    #[test]
    fn test_missing_source_is_skipped() {
        let dest = TempDir::new().unwrap();
        let count = AssetCopier::new()
            .copy(&dest.path().join("nope"), dest.path())
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn test_reserved_paths_are_not_overwritten() {
        let source = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();

        fs::create_dir_all(source.path().join("about")).unwrap();
        fs::write(source.path().join("about/index.html"), b"static").unwrap();
        fs::write(source.path().join("robots.txt"), b"User-agent: *").unwrap();

        fs::create_dir_all(dest.path().join("about")).unwrap();
        fs::write(dest.path().join("about/index.html"), b"generated").unwrap();

        let count = AssetCopier::new()
            .with_reserved([PathBuf::from("about/index.html")])
            .copy(source.path(), dest.path())
            .unwrap();

        assert_eq!(count, 1);
        assert_eq!(fs::read(dest.path().join("about/index.html")).unwrap(), b"generated");
        assert!(dest.path().join("robots.txt").exists());
    }

    #[test]
    fn test_static_file_on_page_directory_is_skipped() {
        let source = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();

        fs::write(source.path().join("about"), b"plain file").unwrap();
        fs::write(source.path().join("about.txt"), b"kept").unwrap();

        fs::create_dir_all(dest.path().join("about")).unwrap();
        fs::write(dest.path().join("about/index.html"), b"generated").unwrap();

        let count = AssetCopier::new()
            .with_reserved([PathBuf::from("about/index.html")])
            .copy(source.path(), dest.path())
            .unwrap();

        assert_eq!(count, 1);
        assert!(dest.path().join("about").is_dir());
        assert_eq!(fs::read(dest.path().join("about/index.html")).unwrap(), b"generated");
        assert_eq!(fs::read(dest.path().join("about.txt")).unwrap(), b"kept");
    }

    #[test]
    fn test_static_directory_on_page_file_is_skipped() {
        let source = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();

        fs::create_dir_all(source.path().join("index.html")).unwrap();
        fs::write(source.path().join("index.html/inner.txt"), b"hidden").unwrap();
        fs::write(dest.path().join("index.html"), b"generated").unwrap();

        let count = AssetCopier::new()
            .with_reserved([PathBuf::from("index.html")])
            .copy(source.path(), dest.path())
            .unwrap();

        assert_eq!(count, 0);
        assert_eq!(fs::read(dest.path().join("index.html")).unwrap(), b"generated");
    }

    #[test]
    fn test_copy_file_creates_parents() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("a.txt");
        fs::write(&src, b"a").unwrap();

        let dest = dir.path().join("x/y/z/a.txt");
        copy_file(&src, &dest).unwrap();
        assert_eq!(fs::read(dest).unwrap(), b"a");
    }
}
