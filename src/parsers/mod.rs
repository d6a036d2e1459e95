// SPDX-License-Identifier: MIT

//! Format parsers: raw uploaded bytes to one canonical [`ParsedActivity`].
//!
//! Two structurally incompatible inputs are supported:
//! - binary FIT, decoded with the external `fitparser` crate
//! - TCX (Training Center XML), deserialized with `quick-xml`
//!
//! Both produce the same output contract; the caller picks the parser by
//! the upload's [`FileFormat`] discriminant.

pub mod fit;
pub mod tcx;

use crate::models::{FileFormat, ParsedActivity};

/// Parse failure, recorded onto the upload as a human-readable reason.
/// Never a process fault: the intake pipeline catches and converts these.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("Not a valid FIT file: {0}")]
    FitDecode(String),

    #[error("FIT file has no session summary")]
    MissingSession,

    #[error("FIT session is missing a start time")]
    MissingStartTime,

    #[error("Not valid XML: {0}")]
    InvalidXml(String),

    #[error("TCX file is not valid UTF-8")]
    InvalidUtf8,

    #[error("No activity found in TCX file")]
    NoActivity,

    #[error("TCX activity start time is invalid")]
    InvalidStartTime,
}

/// Dispatch raw bytes to the parser for `format`.
pub fn parse_activity(format: FileFormat, bytes: &[u8]) -> Result<ParsedActivity, ParseError> {
    match format {
        FileFormat::Fit => fit::parse(bytes),
        FileFormat::Tcx => tcx::parse(bytes),
    }
}
