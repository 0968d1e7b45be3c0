use anyhow::Result;
use clap::Parser;
use pkgia::commands::{Options, archive};
use pkgia::config::parse_year;
use std::path::PathBuf;
use std::process::ExitCode;

/// pkgia - archive old package versions on the Internet Archive
///
/// Each PKG_DIR holds one symlink per historical build of a package, pointing
/// into the dated repository snapshots (`.../repos/<YYYY>/...`). Builds from the
/// selected years are uploaded, with their signatures, to one item per package.
///
/// Credentials are read from the IA_ACCESS_KEY and IA_SECRET_KEY environment
/// variables.
///
/// Examples:
///   pkgia /srv/archive/packages/z/zsh
///   pkgia --year 2017 --year 2018 /srv/archive/packages/*/*
#[derive(Parser, Debug)]
#[command(author, version = env!("PKGIA_VERSION"), about)]
struct Cli {
    /// Package directories to archive, processed in order
    #[arg(value_name = "PKG_DIR", required = true)]
    pub dirs: Vec<PathBuf>,

    /// Only upload builds from these years (defaults to 2013-2016)
    #[arg(
        long = "year",
        short = 'y',
        env = "PKGIA_YEARS",
        value_name = "YYYY",
        value_delimiter = ',',
        value_parser = parse_year_arg
    )]
    pub years: Vec<String>,

    /// Archive collection to upload into (defaults to archlinuxarchive)
    #[arg(long, env = "PKGIA_COLLECTION", value_name = "NAME", value_delimiter = ',')]
    pub collection: Vec<String>,

    /// Prefix of item identifiers (defaults to archlinux_pkg_)
    #[arg(long, value_name = "PREFIX")]
    pub identifier_prefix: Option<String>,

    /// File with the item description template
    #[arg(long, value_name = "FILE")]
    pub description_template: Option<PathBuf>,

    /// S3 endpoint of the archive (defaults to https://s3.us.archive.org)
    #[arg(long, env = "PKGIA_S3_ENDPOINT", value_name = "URL")]
    pub endpoint: Option<String>,

    /// Print what would be uploaded instead of uploading
    #[arg(long)]
    pub dry_run: bool,
}

fn parse_year_arg(s: &str) -> Result<String, String> {
    parse_year(s).map_err(|e| e.to_string())
}

impl Cli {
    fn options(&self) -> Options {
        Options {
            years: self.years.clone(),
            collection: self.collection.clone(),
            identifier_prefix: self.identifier_prefix.clone(),
            description_template: self.description_template.clone(),
            endpoint: self.endpoint.clone(),
            dry_run: self.dry_run,
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();
    let runtime = pkgia::runtime::RealRuntime;

    let summary = archive(runtime, &cli.dirs, &cli.options()).await?;
    if summary.is_success() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}
