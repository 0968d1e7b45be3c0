//! Symlink inspection.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use super::RealRuntime;

impl RealRuntime {
    #[tracing::instrument(skip(self))]
    pub(crate) fn is_symlink_impl(&self, path: &Path) -> bool {
        fs::symlink_metadata(path)
            .map(|m| m.file_type().is_symlink())
            .unwrap_or(false)
    }

    #[tracing::instrument(skip(self))]
    pub(crate) fn read_link_impl(&self, path: &Path) -> Result<PathBuf> {
        fs::read_link(path).with_context(|| format!("Failed to read symlink {}", path.display()))
    }
}

#[cfg(all(test, unix))]
mod tests {
    use crate::runtime::{RealRuntime, Runtime};
    use std::os::unix::fs::symlink;
    use std::path::Path;
    use tempfile::tempdir;

    #[test]
    fn test_read_link_returns_raw_target() {
        let runtime = RealRuntime;
        let dir = tempdir().unwrap();
        let link = dir.path().join("pkg-1.0-1-x86_64.pkg.tar.xz");

        // Dangling relative target: read_link must not resolve or canonicalize it
        symlink("../../repos/2014/01/01/core/os/x86_64/pkg.tar.xz", &link).unwrap();

        assert!(runtime.is_symlink(&link));
        assert_eq!(
            runtime.read_link(&link).unwrap(),
            Path::new("../../repos/2014/01/01/core/os/x86_64/pkg.tar.xz")
        );
    }

    #[test]
    fn test_is_symlink_false_for_regular_file_and_missing_path() {
        let runtime = RealRuntime;
        let dir = tempdir().unwrap();
        let file = dir.path().join("plain");
        std::fs::write(&file, b"").unwrap();

        assert!(!runtime.is_symlink(&file));
        assert!(!runtime.is_symlink(&dir.path().join("missing")));
        assert!(runtime.read_link(&file).is_err());
    }
}
