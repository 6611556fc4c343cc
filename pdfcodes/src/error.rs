//! Error taxonomy shared by the indexing and merging operations.
//!
//! Errors fall into three groups:
//! - user-visible request errors, which abort the whole operation
//!   (see [`Error::is_user_error`]),
//! - recoverable domain errors raised by the assembler and dropped by its caller
//!   ([`Error::PageOutOfRange`]),
//! - everything else, surfaced unchanged as an internal failure.

use crate::config::SourceFilter;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An enumerated request option carried a value outside its domain.
    #[error("invalid value for {option}: '{value}'")]
    InvalidOption { option: &'static str, value: String },

    /// Indexing was requested on a workspace without any PDF.
    #[error("no PDF files to index")]
    NoFiles,

    /// An upload whose name does not end with `.pdf`.
    #[error("only PDF files are accepted, rejected: {0}")]
    NotPdf(String),

    /// A requested code is absent from the index under `on_missing = error`.
    #[error("code not found: {0}")]
    CodeNotFound(String),

    /// A requested code exists, but not from the requested source.
    #[error("code not available from '{filter}': {code}")]
    CodeNotAvailable { code: String, filter: SourceFilter },

    /// A merge produced no page at all.
    #[error("no pages were added, check the {hint}")]
    NothingToMerge { hint: &'static str },

    /// A copy operation pointed past the end of its document.
    #[error("page {page} is out of range for {file} ({page_count} pages)")]
    PageOutOfRange {
        file: String,
        page: usize,
        page_count: usize,
    },

    #[error(transparent)]
    Pdf(#[from] lopdf::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl Error {
    /// Returns `true` for errors caused by the request itself rather than by
    /// the environment.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            Error::InvalidOption { .. }
                | Error::NoFiles
                | Error::NotPdf(_)
                | Error::CodeNotFound(_)
                | Error::CodeNotAvailable { .. }
                | Error::NothingToMerge { .. }
        )
    }
}
