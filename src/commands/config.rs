use anyhow::{Context, Result};
use log::debug;
use reqwest::Client;
use std::path::PathBuf;

use crate::{
    config::ArchiveConfig,
    runtime::Runtime,
    upload::{DryRunUploader, IaS3Uploader, S3Credentials, Uploader},
};

/// Command-line choices that shape a run.
#[derive(Debug, Clone, Default)]
pub struct Options {
    /// Eligible years; empty means the defaults
    pub years: Vec<String>,
    /// Target collections; empty means the defaults
    pub collection: Vec<String>,
    pub identifier_prefix: Option<String>,
    /// File holding a description template
    pub description_template: Option<PathBuf>,
    /// S3 endpoint of the archive
    pub endpoint: Option<String>,
    pub dry_run: bool,
}

pub struct Config<R: Runtime> {
    pub runtime: R,
    pub archive: ArchiveConfig,
    pub uploader: Box<dyn Uploader>,
}

impl<R: Runtime> Config<R> {
    pub fn new(runtime: R, options: &Options) -> Result<Self> {
        let archive = archive_config(&runtime, options)?;
        let uploader = build_uploader(&runtime, options)?;
        Ok(Self {
            runtime,
            archive,
            uploader,
        })
    }
}

/// Defaults overridden by whatever `options` sets.
pub fn archive_config<R: Runtime>(runtime: &R, options: &Options) -> Result<ArchiveConfig> {
    let mut config = ArchiveConfig::default()
        .with_years(options.years.iter().cloned())
        .with_collection(options.collection.iter().cloned());

    if let Some(prefix) = &options.identifier_prefix {
        config.identifier_prefix = prefix.clone();
    }
    if let Some(path) = &options.description_template {
        config.description_template = runtime
            .read_to_string(path)
            .with_context(|| format!("Failed to read description template {}", path.display()))?;
    }

    debug!("Archive config: {:?}", config);
    Ok(config)
}

pub fn build_uploader<R: Runtime>(runtime: &R, options: &Options) -> Result<Box<dyn Uploader>> {
    if options.dry_run {
        return Ok(Box::new(DryRunUploader));
    }

    let credentials = S3Credentials::from_env(runtime);
    if let Some(creds) = &credentials {
        debug!("Using archive credentials for access key {}", creds.access_key);
    }

    let client = Client::builder()
        .user_agent(concat!("pkgia/", env!("PKGIA_VERSION")))
        .build()?;

    Ok(Box::new(IaS3Uploader::new(
        client,
        options.endpoint.clone(),
        credentials,
    )))
}
