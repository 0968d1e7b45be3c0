//! The remote archive, seen from this crate: something that takes an
//! identifier, a list of files and item metadata, and answers with one status
//! code per file.

mod dry_run;
mod s3;

use anyhow::Result;
use async_trait::async_trait;
use std::collections::BTreeSet;
use std::path::PathBuf;

use crate::metadata::UploadMetadata;

pub use dry_run::DryRunUploader;
pub use s3::{DEFAULT_S3_ENDPOINT, IaS3Uploader, S3Credentials};

/// HTTP status the archive answers with for an accepted file.
pub const SUCCESS_STATUS: u16 = 200;

/// Outcome of uploading one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileUploadResult {
    pub file: PathBuf,
    pub status: u16,
}

impl FileUploadResult {
    pub fn is_success(&self) -> bool {
        self.status == SUCCESS_STATUS
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Uploader: Send + Sync {
    /// Upload `files` into the item `identifier`, creating it with `metadata`
    /// if needed. Returns one result per file; an `Err` means the call itself
    /// failed and says nothing about individual files.
    async fn upload(
        &self,
        identifier: &str,
        files: &[PathBuf],
        metadata: &UploadMetadata,
    ) -> Result<Vec<FileUploadResult>>;
}

/// What an upload call amounted to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    /// Every file was accepted
    Success,
    /// At least one file was refused
    Partial {
        succeeded: usize,
        total: usize,
        /// Every distinct status code seen, successful ones included
        codes: BTreeSet<u16>,
    },
    /// The call failed before producing per-file results
    Failed { error: String },
}

impl UploadOutcome {
    pub fn classify(result: Result<Vec<FileUploadResult>>) -> Self {
        match result {
            Ok(results) => {
                let succeeded = results.iter().filter(|r| r.is_success()).count();
                if succeeded == results.len() {
                    UploadOutcome::Success
                } else {
                    UploadOutcome::Partial {
                        succeeded,
                        total: results.len(),
                        codes: results.iter().map(|r| r.status).collect(),
                    }
                }
            }
            Err(e) => UploadOutcome::Failed {
                error: format!("{:#}", e),
            },
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, UploadOutcome::Success)
    }
}
