//! Operator-facing failure reports.
//!
//! Each report names the item, what went wrong and the package directory, so
//! that one package can be re-run by hand later.

use std::collections::BTreeSet;
use std::io::{self, Write};
use std::path::Path;

use crate::identifier::Identifier;
use crate::upload::UploadOutcome;

/// Write a report for `outcome`. Successful uploads produce no output.
pub fn report_outcome<W: Write>(
    out: &mut W,
    identifier: &Identifier,
    directory: &Path,
    outcome: &UploadOutcome,
) -> io::Result<()> {
    match outcome {
        UploadOutcome::Success => Ok(()),
        UploadOutcome::Partial {
            succeeded,
            total,
            codes,
        } => {
            writeln!(
                out,
                "{}: only {}/{} files uploaded, status codes: {}",
                identifier,
                succeeded,
                total,
                format_codes(codes)
            )?;
            writeln!(out, "{}", directory.display())
        }
        UploadOutcome::Failed { error } => {
            writeln!(out, "{}: exception raised", identifier)?;
            writeln!(out, "{}", error)?;
            writeln!(out, "{}", directory.display())
        }
    }
}

/// Report a package that could not be prepared for upload at all.
pub fn report_package_error<W: Write>(
    out: &mut W,
    directory: &Path,
    error: &anyhow::Error,
) -> io::Result<()> {
    writeln!(out, "{}: {:#}", directory.display(), error)
}

fn format_codes(codes: &BTreeSet<u16>) -> String {
    let codes: Vec<String> = codes.iter().map(u16::to_string).collect();
    format!("{{{}}}", codes.join(", "))
}
