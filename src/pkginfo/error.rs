use std::fmt;
use std::io;
use std::path::PathBuf;
use std::string::FromUtf8Error;

/// Errors raised while recovering `.PKGINFO` from a package container.
///
/// `Open` and `Read` are I/O failures. Every other variant means the container
/// (or the metadata inside it) is not what a package should look like.
#[derive(Debug)]
pub enum PkginfoError {
    /// The container file could not be opened
    Open {
        path: PathBuf,
        source: anyhow::Error,
    },
    /// Streaming the container failed part-way
    Read(io::Error),
    /// The stream decodes, but not into a well-formed tar archive
    Malformed(io::Error),
    /// The entry stream ended without a `.PKGINFO` entry
    MissingPkginfo,
    /// `.PKGINFO` is not valid UTF-8
    NotUtf8(FromUtf8Error),
    /// The container uses a compression we have no decoder for
    UnsupportedCompression(&'static str),
    /// `.PKGINFO` lacks a key the upload metadata needs
    MissingField(&'static str),
}

impl PkginfoError {
    pub fn is_io_error(&self) -> bool {
        matches!(self, PkginfoError::Open { .. } | PkginfoError::Read(_))
    }

    pub fn is_format_error(&self) -> bool {
        !self.is_io_error()
    }
}

impl fmt::Display for PkginfoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PkginfoError::Open { path, source } => {
                write!(f, "Cannot open package {}: {}", path.display(), source)
            }
            PkginfoError::Read(e) => write!(f, "Failed to read package stream: {}", e),
            PkginfoError::Malformed(e) => write!(f, "Package is not a valid archive: {}", e),
            PkginfoError::MissingPkginfo => write!(f, "No .PKGINFO entry found in package"),
            PkginfoError::NotUtf8(e) => write!(f, ".PKGINFO is not valid UTF-8: {}", e),
            PkginfoError::UnsupportedCompression(kind) => {
                write!(f, "Unsupported package compression: {}", kind)
            }
            PkginfoError::MissingField(key) => write!(f, ".PKGINFO has no '{}' entry", key),
        }
    }
}

impl std::error::Error for PkginfoError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PkginfoError::Open { source, .. } => Some(source.as_ref()),
            PkginfoError::Read(e) | PkginfoError::Malformed(e) => Some(e),
            PkginfoError::NotUtf8(e) => Some(e),
            _ => None,
        }
    }
}

/// OS-level failures stay `Read`. The tar and decoder crates report broken
/// headers, checksums and truncated streams through the generic kinds below.
impl From<io::Error> for PkginfoError {
    fn from(e: io::Error) -> Self {
        if e.raw_os_error().is_some() {
            return PkginfoError::Read(e);
        }
        match e.kind() {
            io::ErrorKind::Other
            | io::ErrorKind::InvalidData
            | io::ErrorKind::InvalidInput
            | io::ErrorKind::UnexpectedEof => PkginfoError::Malformed(e),
            _ => PkginfoError::Read(e),
        }
    }
}
