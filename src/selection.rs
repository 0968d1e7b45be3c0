//! Decide which files of a package directory form one upload batch.
//!
//! A package directory holds one symlink per historical build, pointing into
//! the dated snapshot tree (`.../repos/<YYYY>/<MM>/<DD>/...`). The year in
//! that target decides whether the build belongs to the batch.

use anyhow::{Result, bail};
use log::debug;
use regex::Regex;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use crate::runtime::Runtime;

/// Captures the year directly after the last `/repos/` component.
static SYMLINK_YEAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^.*/repos/([0-9]{4})/").expect("hard-coded regex is valid"));

/// A symlink found in a package directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageEntry {
    pub path: PathBuf,
    /// Raw link target, as stored in the link
    pub link_target: PathBuf,
}

impl PackageEntry {
    /// Year token embedded in the link target, if the target has one.
    pub fn year(&self) -> Option<String> {
        link_year(&self.link_target.to_string_lossy()).map(str::to_string)
    }
}

/// Files chosen for one upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    /// Every selected file, signatures included, sorted by path
    pub files: Vec<PathBuf>,
    /// File whose `.PKGINFO` describes the item
    pub representative: PathBuf,
}

/// Year token of a link target following the `.../repos/<YYYY>/...` layout.
pub fn link_year(target: &str) -> Option<&str> {
    SYMLINK_YEAR
        .captures(target)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// List the symlinks directly inside `dir`. Regular files and directories are
/// ignored.
#[tracing::instrument(skip(runtime))]
pub fn scan_package_dir<R: Runtime>(runtime: &R, dir: &Path) -> Result<Vec<PackageEntry>> {
    let mut entries = Vec::new();
    for path in runtime.read_dir(dir)? {
        if !runtime.is_symlink(&path) {
            debug!("Skipping non-symlink {}", path.display());
            continue;
        }
        let link_target = runtime.read_link(&path)?;
        entries.push(PackageEntry { path, link_target });
    }
    Ok(entries)
}

/// Paths of entries whose link year is in `years`, sorted.
pub fn filter_by_year(entries: &[PackageEntry], years: &BTreeSet<String>) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = entries
        .iter()
        .filter(|entry| match entry.year() {
            Some(year) => years.contains(&year),
            None => {
                debug!(
                    "No year in link target {} of {}",
                    entry.link_target.display(),
                    entry.path.display()
                );
                false
            }
        })
        .map(|entry| entry.path.clone())
        .collect();
    files.sort_by(|a, b| a.as_os_str().cmp(b.as_os_str()));
    files
}

/// Pick the file that describes the batch: the greatest path, byte-wise, that
/// is not a detached signature.
///
/// This assumes file names sort in version order, which holds for the
/// `name-version-release-arch` naming as long as versions are comparable as
/// strings. Nothing here verifies that.
pub fn representative<'a>(files: &'a [PathBuf], signature_suffix: &str) -> Option<&'a PathBuf> {
    files
        .iter()
        .filter(|path| !path.to_string_lossy().ends_with(signature_suffix))
        .max_by(|a, b| a.as_os_str().cmp(b.as_os_str()))
}

/// Build the batch for `entries`.
///
/// Returns `Ok(None)` when no entry matches the year filter. Fails when the
/// matching entries are all signatures, as there is nothing to describe the
/// item with.
pub fn select_batch(
    entries: &[PackageEntry],
    years: &BTreeSet<String>,
    signature_suffix: &str,
) -> Result<Option<Batch>> {
    let files = filter_by_year(entries, years);
    if files.is_empty() {
        return Ok(None);
    }

    let Some(representative) = representative(&files, signature_suffix).cloned() else {
        bail!(
            "Only signature files match the selected years ({} files)",
            files.len()
        );
    };

    Ok(Some(Batch {
        files,
        representative,
    }))
}
