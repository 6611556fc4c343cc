//! # pdfcodes
//!
//! The `pdfcodes` library indexes a set of PDF files by the alphanumeric codes
//! found in their file names and page text (`MIA-000123`, `AB_12`, ...), and
//! builds new PDFs from that index: the pages of an ordered list of codes, or
//! every numbered part (`{base}_{N}.pdf`) of a list of bases.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! # use std::path::Path;
//! use pdfcodes::config::{IndexRequest, MergeByCodeRequest};
//! use pdfcodes::pipeline::{index_workspace, merge_by_code};
//! use pdfcodes::workspace::Workspace;
//!
//! # async fn try_main() -> pdfcodes::error::Result<()> {
//! let workspace = Workspace::create(Path::new("/tmp/pdfcodes"))?;
//! workspace.add_file(Path::new("MIA-000123.pdf"))?;
//!
//! let summary = index_workspace(&workspace, &IndexRequest::default(), true).await?;
//! println!("{} codes found", summary.codes_found);
//!
//! let outcome = merge_by_code(&workspace, &MergeByCodeRequest::new(["MIA000123"]))?;
//! println!("{} pages written to {}", outcome.pages, outcome.output);
//! # Ok(())
//! # }
//! # #[tokio::main]
//! # async fn main() {
//! #    try_main().await.unwrap();
//! # }
//! ```
//!
//! ## Tests
//!
//! ```sh
//! cargo test
//! ```

pub mod assembler;
pub mod cleaner;
pub mod config;
pub mod converter;
pub mod error;
pub mod extracter;
pub mod indexer;
pub mod models;
pub mod pipeline;
pub mod planner;
pub mod workspace;

#[cfg(test)]
mod test_utils;
