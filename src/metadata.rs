//! Item metadata sent along with an upload.

use serde::Serialize;

use crate::config::ArchiveConfig;
use crate::pkginfo::{Pkginfo, PkginfoError};

/// Metadata of one archive item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadMetadata {
    pub collection: Vec<String>,
    pub mediatype: String,
    pub publisher: String,
    pub creator: String,
    pub subject: Vec<String>,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rights: Option<String>,
}

/// One metadata field as sent to the archive: a single value or an ordered list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldValue<'a> {
    Single(&'a str),
    List(&'a [String]),
}

impl UploadMetadata {
    /// Fixed fields for `pkgname`, before anything is known about its packages.
    pub fn base(config: &ArchiveConfig, pkgname: &str) -> Self {
        let mut subject = config.subject.clone();
        subject.push(pkgname.to_string());

        Self {
            collection: config.collection.clone(),
            mediatype: config.mediatype.clone(),
            publisher: config.publisher.clone(),
            creator: config.creator.clone(),
            subject,
            title: format!("{}{}", pkgname, config.title_suffix),
            description: None,
            rights: None,
        }
    }

    /// Fill `description` and `rights` from the representative package.
    /// Fails when `.PKGINFO` lacks `url` or `license`.
    pub fn apply_pkginfo(
        &mut self,
        template: &str,
        pkgname: &str,
        info: &Pkginfo,
    ) -> Result<(), PkginfoError> {
        let url = info.url()?;
        let license = info.license()?;

        self.description = Some(render_description(
            template,
            &[
                ("pkgdesc", info.pkgdesc()),
                ("pkgname", pkgname),
                ("url", url),
                ("license", license),
            ],
        ));
        self.rights = Some(format!("License: {}", license));
        Ok(())
    }

    /// Fields in a stable order, skipping unset optional ones.
    pub fn fields(&self) -> Vec<(&'static str, FieldValue<'_>)> {
        let mut fields = vec![
            ("collection", FieldValue::List(&self.collection)),
            ("mediatype", FieldValue::Single(&self.mediatype)),
            ("publisher", FieldValue::Single(&self.publisher)),
            ("creator", FieldValue::Single(&self.creator)),
            ("subject", FieldValue::List(&self.subject)),
            ("title", FieldValue::Single(&self.title)),
        ];
        if let Some(description) = &self.description {
            fields.push(("description", FieldValue::Single(description)));
        }
        if let Some(rights) = &self.rights {
            fields.push(("rights", FieldValue::Single(rights)));
        }
        fields
    }
}

/// Substitute `{name}` placeholders in one pass. Substituted text is never
/// scanned again, and unknown placeholders are kept verbatim.
pub fn render_description(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let value = after
            .find('}')
            .and_then(|close| {
                let name = &after[..close];
                values
                    .iter()
                    .find(|(key, _)| *key == name)
                    .map(|(_, value)| (*value, close))
            });
        match value {
            Some((value, close)) => {
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}
