use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display};

/// Provenance of a hit.
///
/// The declaration order matches the lexical order of the wire names
/// (`"content"` < `"filename"`), which the merge planner sorts on.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum HitSource {
    Content,
    Filename,
}

/// One occurrence of a code.
///
/// # Fields
///
/// * `file` - Name of the PDF the code was found in.
/// * `page` - 0-based page index. For filename hits this is always `0` and
///   stands for the whole document unless first-page copying is requested.
/// * `source` - Where the code was found.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Hit {
    pub file: String,
    pub page: usize,
    pub source: HitSource,
}

impl Hit {
    pub fn filename(file: &str) -> Hit {
        Hit {
            file: file.to_string(),
            page: 0,
            source: HitSource::Filename,
        }
    }

    pub fn content(file: &str, page: usize) -> Hit {
        Hit {
            file: file.to_string(),
            page,
            source: HitSource::Content,
        }
    }
}

/// Code → hits, in insertion order.
pub type CodeMap = IndexMap<String, Vec<Hit>>;

/// The code index of a file set, as persisted in `index.json`.
///
/// An index is built in one pass and replaces any previous one; hit lists are
/// never modified afterwards.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Index {
    #[serde(default)]
    pub files: Vec<String>,
    #[serde(default)]
    pub by_code: CodeMap,
}

impl Index {
    pub fn new(files: Vec<String>, by_code: CodeMap) -> Index {
        Index { files, by_code }
    }

    /// Returns the hits of `code`, or an empty slice.
    pub fn hits(&self, code: &str) -> &[Hit] {
        self.by_code.get(code).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn code_count(&self) -> usize {
        self.by_code.len()
    }

    /// Returns the first `n` codes with their hits.
    pub fn sample(&self, n: usize) -> CodeMap {
        self.by_code.iter().take(n).map(|(code, hits)| (code.clone(), hits.clone())).collect()
    }
}

/// One instruction for the page assembler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Operation {
    CopyPage { file: String, page: usize },
    CopyWholeDocument { file: String },
}

impl Operation {
    pub fn file(&self) -> &str {
        match self {
            Operation::CopyPage { file, .. } => file,
            Operation::CopyWholeDocument { file } => file,
        }
    }
}

/// Human-readable trace of an operation, returned with its result.
///
/// Lines are emitted to `tracing` as they are recorded; [`Diagnostics::extend`]
/// appends lines that were already emitted elsewhere.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Diagnostics {
    lines: Vec<String>,
}

impl Diagnostics {
    pub fn new() -> Diagnostics {
        Diagnostics { lines: Vec::new() }
    }

    pub fn info(&mut self, line: impl Into<String>) {
        let line = line.into();
        tracing::info!("{}", line);
        self.lines.push(line);
    }

    pub fn warn(&mut self, line: impl Into<String>) {
        let line = line.into();
        tracing::warn!("{}", line);
        self.lines.push(line);
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.lines.extend(other.lines);
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Returns the first `n` lines.
    pub fn head(&self, n: usize) -> Vec<String> {
        self.lines.iter().take(n).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}
