//! Settings that shape one archiving run.

use anyhow::{Result, bail};
use std::collections::BTreeSet;

/// Years whose packages are uploaded when none are given.
pub const DEFAULT_YEARS: [&str; 4] = ["2013", "2014", "2015", "2016"];

pub const DEFAULT_IDENTIFIER_PREFIX: &str = "archlinux_pkg_";

/// Item description. `{pkgdesc}`, `{pkgname}`, `{url}` and `{license}` are
/// substituted per package.
pub const DEFAULT_DESCRIPTION_TEMPLATE: &str = r#"{pkgdesc}

This item contains old versions of the <a href="https://www.archlinux.org/packages/{pkgname}">Arch Linux package for {pkgname}</a>.
Website of the upstream project: <a href="{url}">{url}</a>
License: {license}
See the <a href="https://wiki.archlinux.org/index.php/Arch_Linux_Archive">Arch Linux Archive documentation</a> for details.
"#;

/// Suffix of detached signatures stored next to each package file.
pub const DEFAULT_SIGNATURE_SUFFIX: &str = ".sig";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveConfig {
    /// Eligible year tokens; links from other years are left out of the batch.
    pub years: BTreeSet<String>,
    pub identifier_prefix: String,
    pub description_template: String,
    pub signature_suffix: String,
    pub collection: Vec<String>,
    pub mediatype: String,
    pub publisher: String,
    pub creator: String,
    /// Subject tags; the package name is appended for each item.
    pub subject: Vec<String>,
    /// Appended to the package name to form the item title.
    pub title_suffix: String,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            years: DEFAULT_YEARS.iter().map(|y| y.to_string()).collect(),
            identifier_prefix: DEFAULT_IDENTIFIER_PREFIX.to_string(),
            description_template: DEFAULT_DESCRIPTION_TEMPLATE.to_string(),
            signature_suffix: DEFAULT_SIGNATURE_SUFFIX.to_string(),
            collection: vec!["archlinuxarchive".to_string()],
            mediatype: "software".to_string(),
            publisher: "Arch Linux".to_string(),
            creator: "Arch Linux".to_string(),
            subject: vec!["archlinux".to_string(), "archlinux package".to_string()],
            title_suffix: " package archive from Arch Linux".to_string(),
        }
    }
}

impl ArchiveConfig {
    /// Replace the eligible years. An empty iterator keeps the current set.
    pub fn with_years<I, S>(mut self, years: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let years: BTreeSet<String> = years.into_iter().map(Into::into).collect();
        if !years.is_empty() {
            self.years = years;
        }
        self
    }

    /// Replace the collections. An empty iterator keeps the current list.
    pub fn with_collection<I, S>(mut self, collection: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let collection: Vec<String> = collection.into_iter().map(Into::into).collect();
        if !collection.is_empty() {
            self.collection = collection;
        }
        self
    }
}

/// Validate a year token given on the command line: exactly four ASCII digits.
pub fn parse_year(s: &str) -> Result<String> {
    let s = s.trim();
    if s.len() != 4 || !s.bytes().all(|b| b.is_ascii_digit()) {
        bail!("Invalid year '{}'. Expected four digits, e.g. 2014.", s);
    }
    Ok(s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_years() {
        let config = ArchiveConfig::default();
        let years: Vec<&str> = config.years.iter().map(String::as_str).collect();
        assert_eq!(years, vec!["2013", "2014", "2015", "2016"]);
    }

    #[test]
    fn test_with_years_replaces_set() {
        let config = ArchiveConfig::default().with_years(["2017", "2018", "2017"]);
        assert_eq!(config.years.len(), 2);
        assert!(config.years.contains("2017"));
        assert!(!config.years.contains("2013"));
    }

    #[test]
    fn test_with_empty_years_keeps_defaults() {
        let config = ArchiveConfig::default().with_years(Vec::<String>::new());
        assert_eq!(config.years.len(), 4);
    }

    #[test]
    fn test_with_collection() {
        let config = ArchiveConfig::default().with_collection(["test_collection"]);
        assert_eq!(config.collection, vec!["test_collection"]);
        let config = config.with_collection(Vec::<&str>::new());
        assert_eq!(config.collection, vec!["test_collection"]);
    }

    #[test]
    fn test_parse_year() {
        assert_eq!(parse_year("2014").unwrap(), "2014");
        assert_eq!(parse_year(" 2015 ").unwrap(), "2015");
        assert!(parse_year("14").is_err());
        assert!(parse_year("20140").is_err());
        assert!(parse_year("２０１４").is_err());
        assert!(parse_year("abcd").is_err());
    }
}
