//! Request types and their enumerated options.
//!
//! Every option enum round-trips through the same snake_case strings on the
//! wire (`serde`) and on the command line (`strum`). Use [`parse_option`] to
//! turn a raw string into an option with a user-facing error.

use crate::error::{Error, Result};
use crate::extracter::DEFAULT_CODE_PATTERN;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use strum::{AsRefStr, Display, EnumString};

/// Default page limit per file for content scanning.
pub const DEFAULT_MAX_PAGES: usize = 10000;

/// Where the index builder looks for codes.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ScanMode {
    Content,
    Filename,
    #[default]
    #[serde(alias = "hybrid")]
    #[strum(to_string = "both", serialize = "hybrid")]
    Both,
}

/// How many hits of a code are copied.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PagesPerCode {
    #[default]
    First,
    All,
}

/// What happens when a requested code has no usable hit.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum OnMissing {
    #[default]
    Skip,
    Error,
}

/// Restricts the hits used for merging to one source.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SourceFilter {
    #[default]
    Any,
    Content,
    Filename,
}

/// How a hit that came from a file name is copied.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FilenameBehavior {
    #[default]
    FirstPage,
    EntirePdf,
}

/// Parses an option value, reporting unknown values as [`Error::InvalidOption`].
///
/// # Arguments
///
/// * `option` - The option name, used in the error message.
/// * `value` - The raw value.
pub fn parse_option<T: FromStr>(option: &'static str, value: &str) -> Result<T> {
    value.trim().parse::<T>().map_err(|_| Error::InvalidOption {
        option,
        value: value.to_string(),
    })
}

fn default_pattern() -> String {
    DEFAULT_CODE_PATTERN.to_string()
}

fn default_max_pages() -> usize {
    DEFAULT_MAX_PAGES
}

fn default_code_output() -> String {
    "merged_by_code.pdf".to_string()
}

fn default_bases_output() -> String {
    "merged_by_bases.pdf".to_string()
}

/// Parameters of an index build.
///
/// # Fields
///
/// * `pattern` - Content pattern (case-insensitive).
/// * `scan_mode` - Filename, content, or both.
/// * `max_pages` - Pages scanned per file; `0` scans nothing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexRequest {
    #[serde(default = "default_pattern")]
    pub pattern: String,
    #[serde(default)]
    pub scan_mode: ScanMode,
    #[serde(default = "default_max_pages")]
    pub max_pages: usize,
}

impl Default for IndexRequest {
    fn default() -> Self {
        IndexRequest {
            pattern: default_pattern(),
            scan_mode: ScanMode::default(),
            max_pages: DEFAULT_MAX_PAGES,
        }
    }
}

/// Merge the pages indexed for an ordered list of codes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergeByCodeRequest {
    pub order: Vec<String>,
    #[serde(default = "default_code_output")]
    pub output_name: String,
    #[serde(default)]
    pub pages_per_code: PagesPerCode,
    #[serde(default)]
    pub on_missing: OnMissing,
    #[serde(default)]
    pub source_filter: SourceFilter,
    #[serde(default)]
    pub filename_behavior: FilenameBehavior,
}

impl MergeByCodeRequest {
    /// Creates a request for `order` with every option at its default.
    pub fn new<S: Into<String>>(order: impl IntoIterator<Item = S>) -> MergeByCodeRequest {
        MergeByCodeRequest {
            order: order.into_iter().map(Into::into).collect(),
            output_name: default_code_output(),
            pages_per_code: PagesPerCode::default(),
            on_missing: OnMissing::default(),
            source_filter: SourceFilter::default(),
            filename_behavior: FilenameBehavior::default(),
        }
    }
}

/// Merge every numbered part (`{base}_{N}.pdf`) of each base, in request order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergeByBaseRequest {
    pub bases: Vec<String>,
    #[serde(default = "default_bases_output")]
    pub output_name: String,
}

impl MergeByBaseRequest {
    pub fn new<S: Into<String>>(bases: impl IntoIterator<Item = S>) -> MergeByBaseRequest {
        MergeByBaseRequest {
            bases: bases.into_iter().map(Into::into).collect(),
            output_name: default_bases_output(),
        }
    }
}
