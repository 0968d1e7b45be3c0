//! Recover the `.PKGINFO` metadata block from a package container.
//!
//! A package is a (usually compressed) tar stream whose first entries are
//! metadata files. Only the entry list is walked, and the walk stops at
//! `.PKGINFO`, so the payload files behind it are never decompressed.

mod compression;
mod error;

use std::collections::BTreeMap;
use std::io::{self, BufRead, BufReader, Read};
use std::path::Path;

use log::debug;
use tar::Archive;

use crate::runtime::Runtime;

pub use compression::{Compression, decompress};
pub use error::PkginfoError;

/// Name of the metadata entry inside a package.
pub const PKGINFO_ENTRY: &str = ".PKGINFO";

/// Key/value pairs parsed from a `.PKGINFO` file.
///
/// Keys such as `depend` or `license` may legitimately appear several times;
/// only the last occurrence is kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pkginfo {
    fields: BTreeMap<String, String>,
}

impl Pkginfo {
    /// Parse `key = value` lines. Lines without that shape (comments, blanks)
    /// are skipped.
    pub fn parse(text: &str) -> Self {
        let mut fields = BTreeMap::new();
        for line in text.lines() {
            if let Some((key, value)) = parse_line(line) {
                // TODO: keep every value of multi-valued keys (depend, license, ...)
                fields.insert(key.to_string(), value.to_string());
            }
        }
        Self { fields }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    /// Short description, empty when the package has none.
    pub fn pkgdesc(&self) -> &str {
        self.get("pkgdesc").unwrap_or_default()
    }

    pub fn url(&self) -> Result<&str, PkginfoError> {
        self.get("url").ok_or(PkginfoError::MissingField("url"))
    }

    pub fn license(&self) -> Result<&str, PkginfoError> {
        self.get("license")
            .ok_or(PkginfoError::MissingField("license"))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

fn parse_line(line: &str) -> Option<(&str, &str)> {
    let (key, value) = line.split_once(" = ")?;
    if key.contains('=') {
        return None;
    }
    Some((key.trim(), value.trim()))
}

/// Open `package` through the runtime and parse its `.PKGINFO`.
#[tracing::instrument(skip(runtime))]
pub fn extract_pkginfo<R: Runtime>(runtime: &R, package: &Path) -> Result<Pkginfo, PkginfoError> {
    debug!("Reading .PKGINFO from {}", package.display());
    let file = runtime
        .open(package)
        .map_err(|source| PkginfoError::Open {
            path: package.to_path_buf(),
            source,
        })?;
    read_pkginfo(BufReader::new(file))
}

/// Parse `.PKGINFO` out of an already opened package stream.
pub fn read_pkginfo<R: BufRead>(reader: R) -> Result<Pkginfo, PkginfoError> {
    let mut archive = Archive::new(decompress(reader)?);
    let raw = read_first_matching(&mut archive, |name| name == PKGINFO_ENTRY.as_bytes())?
        .ok_or(PkginfoError::MissingPkginfo)?;
    let text = String::from_utf8(raw).map_err(PkginfoError::NotUtf8)?;
    Ok(Pkginfo::parse(&text))
}

/// Walk the archive in order and return the body of the first entry whose raw
/// name satisfies `stop`. Nothing after that entry is read.
fn read_first_matching<R: Read>(
    archive: &mut Archive<R>,
    mut stop: impl FnMut(&[u8]) -> bool,
) -> io::Result<Option<Vec<u8>>> {
    for entry in archive.entries()? {
        let mut entry = entry?;
        if stop(&entry.path_bytes()) {
            let mut body = Vec::new();
            entry.read_to_end(&mut body)?;
            return Ok(Some(body));
        }
    }
    Ok(None)
}
