use anyhow::Result;
use async_trait::async_trait;
use std::path::PathBuf;

use super::{FileUploadResult, SUCCESS_STATUS, Uploader};
use crate::metadata::UploadMetadata;

/// Prints what would be uploaded and reports every file as accepted.
pub struct DryRunUploader;

#[async_trait]
impl Uploader for DryRunUploader {
    async fn upload(
        &self,
        identifier: &str,
        files: &[PathBuf],
        metadata: &UploadMetadata,
    ) -> Result<Vec<FileUploadResult>> {
        println!("{} ({} files)", identifier, files.len());
        for file in files {
            println!("  {}", file.display());
        }
        println!("{}", serde_json::to_string_pretty(metadata)?);

        Ok(files
            .iter()
            .map(|file| FileUploadResult {
                file: file.clone(),
                status: SUCCESS_STATUS,
            })
            .collect())
    }
}
