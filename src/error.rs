//! Error taxonomy for the extraction pipeline.
//!
//! - [`SourceError`]: fatal for one source file; the other source still runs.
//! - [`RequestError`]: fatal for the whole request.
//! - [`OracleError`]: never leaves the subject normalizer, always answered
//!   with the first-token fallback mapping.
//! - [`ExportError`]: rendering a grid as delimited text failed.

use thiserror::Error;

use crate::models::SourceKind;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum SourceError {
    #[error("source '{location}' could not be read: {reason}")]
    Unreadable { location: String, reason: String },

    #[error("failed to fetch '{url}': {reason}")]
    Fetch { url: String, reason: String },

    #[error("anchor '{anchor}' not found in source")]
    AnchorNotFound { anchor: String },

    #[error("no time columns found under the header row")]
    NoTimeColumnsFound,
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum RequestError {
    #[error("no subjects selected")]
    NoSubjectsSelected,

    #[error("subjects have not been fetched yet")]
    MappingNotInitialised,

    #[error("no source produced usable data (class: {}, lab: {})", describe(.class), describe(.lab))]
    NoUsableSource {
        class: Option<String>,
        lab: Option<String>,
    },
}

fn describe(failure: &Option<String>) -> &str {
    failure.as_deref().unwrap_or("ok")
}

impl RequestError {
    /// Builds `NoUsableSource` from the two per-file failures.
    pub fn no_usable_source(failures: &[(SourceKind, SourceError)]) -> Self {
        let failure_of = |kind: SourceKind| {
            failures
                .iter()
                .find(|(k, _)| *k == kind)
                .map(|(_, e)| e.to_string())
        };
        RequestError::NoUsableSource {
            class: failure_of(SourceKind::Class),
            lab: failure_of(SourceKind::Lab),
        }
    }
}

#[derive(Debug, Error)]
pub enum OracleError {
    #[error("subject oracle is not configured")]
    Unavailable,

    #[error("oracle request failed: {0}")]
    Transport(String),

    #[error("oracle returned an unusable mapping: {0}")]
    Malformed(String),
}

impl From<reqwest::Error> for OracleError {
    fn from(e: reqwest::Error) -> Self {
        OracleError::Transport(e.to_string())
    }
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("export produced invalid utf-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}
