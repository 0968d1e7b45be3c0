//! Archive item identifiers.

use anyhow::{Context, Result};
use std::fmt;
use std::path::Path;

/// Characters the archive rejects in identifiers that package names may
/// contain. Only alphanumerics, `-` and `_` are allowed there.
const DISALLOWED: [char; 3] = ['@', '+', '.'];

/// Identifier of one remote archive item (one package name).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identifier(String);

impl Identifier {
    /// Build the identifier for `pkgname`: `prefix` followed by the name, with
    /// every `@`, `+` and `.` replaced by `_`.
    pub fn for_package(prefix: &str, pkgname: &str) -> Self {
        Identifier(clean_name(&format!("{}{}", prefix, pkgname)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Replace the characters the archive rejects by `_`. Other characters are
/// left alone, even ones the archive might also refuse.
pub fn clean_name(name: &str) -> String {
    name.replace(DISALLOWED, "_")
}

/// Package name of a package directory: its last path component.
pub fn package_name(dir: &Path) -> Result<String> {
    let name = dir
        .file_name()
        .with_context(|| format!("Cannot derive a package name from {}", dir.display()))?;
    Ok(name.to_string_lossy().into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier_sanitization() {
        let id = Identifier::for_package("archlinux_pkg_", "foo+bar@1.2");
        assert_eq!(id.as_str(), "archlinux_pkg_foo_bar_1_2");
        assert_eq!(id.to_string(), "archlinux_pkg_foo_bar_1_2");
    }

    #[test]
    fn test_clean_name_leaves_other_characters() {
        assert_eq!(clean_name("gtk2-perl"), "gtk2-perl");
        assert_eq!(clean_name("lib32-gcc-libs"), "lib32-gcc-libs");
        assert_eq!(clean_name("a:b/c"), "a:b/c");
        assert_eq!(clean_name("python2.7++"), "python2_7__");
    }

    #[test]
    fn test_prefix_is_sanitized_too() {
        let id = Identifier::for_package("test.", "pkg");
        assert_eq!(id.as_str(), "test_pkg");
    }

    #[test]
    fn test_package_name() {
        assert_eq!(
            package_name(Path::new("/srv/archive/packages/l/libfoo")).unwrap(),
            "libfoo"
        );
        // Trailing separators do not hide the name
        assert_eq!(package_name(Path::new("packages/g/gcc/")).unwrap(), "gcc");
        assert!(package_name(Path::new("/")).is_err());
        assert!(package_name(Path::new("..")).is_err());
    }
}
