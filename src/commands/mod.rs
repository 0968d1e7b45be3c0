use anyhow::{Context, Result};
use log::{debug, info, warn};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::{
    config::ArchiveConfig,
    identifier::{Identifier, package_name},
    metadata::UploadMetadata,
    pkginfo::extract_pkginfo,
    report::{report_outcome, report_package_error},
    runtime::Runtime,
    selection::{scan_package_dir, select_batch},
    upload::{UploadOutcome, Uploader},
};

pub mod config;

pub use config::{Config, Options};

/// What happened to one package directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PackageOutcome {
    /// No link matched the eligible years, nothing was uploaded
    Skipped,
    Uploaded {
        identifier: Identifier,
        files: usize,
        outcome: UploadOutcome,
    },
}

/// Totals over a run of several package directories.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub uploaded: usize,
    pub skipped: usize,
    /// Packages whose upload was partial or failed (already reported)
    pub upload_failures: usize,
    /// Directories that could not be prepared for upload
    pub failed_dirs: Vec<PathBuf>,
}

impl RunSummary {
    pub fn is_success(&self) -> bool {
        self.failed_dirs.is_empty()
    }
}

/// Archive every directory in `dirs` with the settings from `options`.
#[tracing::instrument(skip(runtime, options))]
pub async fn archive<R: Runtime>(
    runtime: R,
    dirs: &[PathBuf],
    options: &Options,
) -> Result<RunSummary> {
    let config = Config::new(runtime, options)?;
    let mut stderr = std::io::stderr();
    run(
        &config.runtime,
        config.uploader.as_ref(),
        &config.archive,
        dirs,
        &mut stderr,
    )
    .await
}

/// Process `dirs` one after the other.
///
/// A directory that cannot be prepared (unreadable, malformed package) is
/// reported on `err_out` and recorded in the summary; the run moves on.
pub async fn run<R, U, W>(
    runtime: &R,
    uploader: &U,
    config: &ArchiveConfig,
    dirs: &[PathBuf],
    err_out: &mut W,
) -> Result<RunSummary>
where
    R: Runtime,
    U: Uploader + ?Sized,
    W: Write,
{
    let mut summary = RunSummary::default();

    for dir in dirs {
        match upload_package(runtime, uploader, config, dir, err_out).await {
            Ok(PackageOutcome::Skipped) => summary.skipped += 1,
            Ok(PackageOutcome::Uploaded { outcome, .. }) => {
                if outcome.is_success() {
                    summary.uploaded += 1;
                } else {
                    summary.upload_failures += 1;
                }
            }
            Err(e) => {
                warn!("Failed to process {}: {:#}", dir.display(), e);
                if let Err(write_err) = report_package_error(err_out, dir, &e) {
                    warn!("Failed to report error for {}: {}", dir.display(), write_err);
                }
                summary.failed_dirs.push(dir.clone());
            }
        }
    }

    debug!("Run summary: {:?}", summary);
    Ok(summary)
}

/// Select, describe and upload the builds in one package directory.
///
/// Upload problems are reported on `err_out` and returned as part of the
/// outcome. Problems reading the directory or the representative package are
/// returned as errors.
#[tracing::instrument(skip(runtime, uploader, config, err_out))]
pub async fn upload_package<R, U, W>(
    runtime: &R,
    uploader: &U,
    config: &ArchiveConfig,
    dir: &Path,
    err_out: &mut W,
) -> Result<PackageOutcome>
where
    R: Runtime,
    U: Uploader + ?Sized,
    W: Write,
{
    let pkgname = package_name(dir)?;
    let entries = scan_package_dir(runtime, dir)?;

    let Some(batch) = select_batch(&entries, &config.years, &config.signature_suffix)? else {
        debug!(
            "No files of {} from years {:?}, skipping",
            pkgname, config.years
        );
        return Ok(PackageOutcome::Skipped);
    };

    let identifier = Identifier::for_package(&config.identifier_prefix, &pkgname);

    let pkginfo = extract_pkginfo(runtime, &batch.representative).with_context(|| {
        format!(
            "Cannot describe package {}",
            batch.representative.display()
        )
    })?;

    let mut metadata = UploadMetadata::base(config, &pkgname);
    metadata
        .apply_pkginfo(&config.description_template, &pkgname, &pkginfo)
        .with_context(|| {
            format!(
                "Cannot describe package {}",
                batch.representative.display()
            )
        })?;

    info!(
        "Uploading {} files of {} as {}...",
        batch.files.len(),
        pkgname,
        identifier
    );

    let result = uploader
        .upload(identifier.as_str(), &batch.files, &metadata)
        .await;
    let outcome = UploadOutcome::classify(result);

    report_outcome(err_out, &identifier, dir, &outcome)
        .context("Failed to write upload report")?;

    Ok(PackageOutcome::Uploaded {
        identifier,
        files: batch.files.len(),
        outcome,
    })
}
