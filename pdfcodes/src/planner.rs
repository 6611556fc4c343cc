//! Merge planning.
//!
//! Turns an index and a merge request into the ordered list of copy operations
//! handed to the page assembler. Planning never touches the PDFs themselves.

use regex::RegexBuilder;
use serde::Serialize;

use crate::cleaner::normalize_code;
use crate::config::{
    FilenameBehavior, MergeByBaseRequest, MergeByCodeRequest, OnMissing, PagesPerCode, SourceFilter,
};
use crate::error::{Error, Result};
use crate::models::{Diagnostics, Hit, HitSource, Index, Operation};

/// What to check when a merge by code copies nothing.
pub(crate) const CODE_MERGE_HINT: &str = "index, filters and order";
/// What to check when a merge by bases copies nothing.
pub(crate) const BASE_MERGE_HINT: &str = "bases and files";

/// Operations to apply, plus the requested items that produced none.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MergePlan {
    pub operations: Vec<Operation>,
    pub skipped: Vec<String>,
    /// One line per skipped item.
    pub log: Diagnostics,
}

impl SourceFilter {
    pub fn accepts(&self, source: HitSource) -> bool {
        match self {
            SourceFilter::Any => true,
            SourceFilter::Content => source == HitSource::Content,
            SourceFilter::Filename => source == HitSource::Filename,
        }
    }
}

fn operation_for(hit: &Hit, behavior: FilenameBehavior) -> Operation {
    // Filename hits carry page 0; under FirstPage that page is copied as is.
    if hit.source == HitSource::Filename && behavior == FilenameBehavior::EntirePdf {
        Operation::CopyWholeDocument {
            file: hit.file.clone(),
        }
    } else {
        Operation::CopyPage {
            file: hit.file.clone(),
            page: hit.page,
        }
    }
}

/// Plans a merge of the pages indexed for each requested code.
///
/// Codes are processed in request order and normalized before lookup. For
/// each code, hits are filtered by source, stably sorted by
/// `(source, file name case-insensitively, page)`, and either the first or all
/// of them are copied.
///
/// # Arguments
///
/// * `index` - The index built for the workspace.
/// * `request` - Requested codes and merge options.
///
/// # Errors
///
/// - [`Error::CodeNotFound`] / [`Error::CodeNotAvailable`] under
///   `on_missing = error`, before any operation is returned.
/// - [`Error::NothingToMerge`] when no operation was planned.
pub fn plan_merge_by_code(index: &Index, request: &MergeByCodeRequest) -> Result<MergePlan> {
    let mut plan = MergePlan::default();

    for requested in request.order.iter() {
        let code = normalize_code(requested);
        let mut hits: Vec<&Hit> = index.hits(&code).iter().collect();
        if hits.is_empty() {
            if request.on_missing == OnMissing::Error {
                return Err(Error::CodeNotFound(requested.clone()));
            }
            plan.log.warn(format!("Code not found, skipping: {}", requested));
            plan.skipped.push(requested.clone());
            continue;
        }

        if request.source_filter != SourceFilter::Any {
            hits.retain(|h| request.source_filter.accepts(h.source));
            if hits.is_empty() {
                if request.on_missing == OnMissing::Error {
                    return Err(Error::CodeNotAvailable {
                        code: requested.clone(),
                        filter: request.source_filter,
                    });
                }
                plan.log.warn(format!(
                    "Code not available from '{}', skipping: {}",
                    request.source_filter, requested
                ));
                plan.skipped.push(requested.clone());
                continue;
            }
        }

        hits.sort_by_cached_key(|h| (h.source.as_ref().to_string(), h.file.to_lowercase(), h.page));

        let selected = match request.pages_per_code {
            PagesPerCode::First => &hits[..1],
            PagesPerCode::All => &hits[..],
        };
        for hit in selected {
            plan.operations.push(operation_for(hit, request.filename_behavior));
        }
    }

    if plan.operations.is_empty() {
        return Err(Error::NothingToMerge {
            hint: CODE_MERGE_HINT,
        });
    }
    return Ok(plan);
}

/// Finds the numbered parts `{base}_{N}.pdf` of `base` among `files`.
///
/// Matching is case-insensitive; `N` is one or more ASCII digits of any width.
///
/// # Returns
///
/// The matching files sorted by `N` ascending; ties keep their order in `files`.
pub fn find_parts(base: &str, files: &[String]) -> Result<Vec<String>> {
    let pattern = RegexBuilder::new(&format!(r"^{}_([0-9]+)\.pdf$", regex::escape(base)))
        .case_insensitive(true)
        .build()
        .map_err(|e| Error::Internal(e.into()))?;

    let mut parts: Vec<(usize, &str, &String)> = Vec::new();
    for file in files {
        if let Some(caps) = pattern.captures(file) {
            let digits = caps.get(1).map_or("", |m| m.as_str()).trim_start_matches('0');
            parts.push((digits.len(), digits, file));
        }
    }
    // (length, digits) orders arbitrarily wide integers without parsing them
    parts.sort_by(|a, b| (a.0, a.1).cmp(&(b.0, b.1)));

    Ok(parts.into_iter().map(|(_, _, file)| file.clone()).collect())
}

/// Plans a merge of whole documents grouped by base.
///
/// Each base resolves to its numbered parts, or to `{base}.pdf` when it has
/// none; a base matching nothing is skipped.
///
/// # Arguments
///
/// * `files` - The file names available in the workspace.
/// * `request` - The requested bases, in output order.
///
/// # Errors
///
/// [`Error::NothingToMerge`] when no base matched any file.
pub fn plan_merge_by_bases(files: &[String], request: &MergeByBaseRequest) -> Result<MergePlan> {
    let mut plan = MergePlan::default();

    for base in request.bases.iter() {
        let mut parts = find_parts(base, files)?;
        if parts.is_empty() {
            let single = format!("{}.pdf", base);
            if files.contains(&single) {
                parts.push(single);
            } else {
                plan.log.warn(format!("No files for base, skipping: {}", base));
                plan.skipped.push(base.clone());
                continue;
            }
        }
        for file in parts {
            plan.operations.push(Operation::CopyWholeDocument { file });
        }
    }

    if plan.operations.is_empty() {
        return Err(Error::NothingToMerge {
            hint: BASE_MERGE_HINT,
        });
    }
    Ok(plan)
}
