//! Workspace-level operations: build the index, merge by code, merge by bases.

use serde::Serialize;
use std::sync::Arc;

use crate::assembler::{assemble, MergeSummary};
use crate::config::{IndexRequest, MergeByBaseRequest, MergeByCodeRequest, ScanMode};
use crate::converter::DirectoryLoader;
use crate::error::{Error, Result};
use crate::indexer::build_index;
use crate::models::{CodeMap, Diagnostics};
use crate::planner::{
    plan_merge_by_bases, plan_merge_by_code, MergePlan, BASE_MERGE_HINT, CODE_MERGE_HINT,
};
use crate::workspace::{safe_pdf_name, Workspace};

const SAMPLE_CODES: usize = 5;
const SAMPLE_LOG_LINES: usize = 10;

/// What an index build found.
///
/// # Fields
///
/// * `index_sample` - The first codes of the index with their hits.
/// * `debug_log` - The first lines of the trace; the full trace is in the
///   workspace's `debug_log.txt`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexSummary {
    pub scan_mode: ScanMode,
    pub files_processed: usize,
    pub total_files: usize,
    pub codes_found: usize,
    pub index_sample: CodeMap,
    pub debug_log: Vec<String>,
}

/// What a merge wrote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MergeOutcome {
    /// File name of the output inside the workspace.
    pub output: String,
    pub pages: usize,
    pub operations_applied: usize,
    /// Requested codes or bases that contributed nothing.
    pub skipped: Vec<String>,
    /// Skipped items and dropped operations, in the order they happened.
    pub debug_log: Vec<String>,
}

/// Indexes every uploaded PDF of `workspace` and replaces its `index.json`
/// and `debug_log.txt`.
///
/// # Errors
///
/// [`Error::NoFiles`] when nothing was uploaded.
pub async fn index_workspace(
    workspace: &Workspace,
    request: &IndexRequest,
    verbose: bool,
) -> Result<IndexSummary> {
    let files = workspace.pdf_files()?;
    let loader = Arc::new(DirectoryLoader::new(workspace.uploads_dir()));
    let report = build_index(files, request, loader, verbose).await?;

    workspace.save_index(&report.index)?;
    workspace.write_debug_log(request.scan_mode, &request.pattern, &report.log)?;

    Ok(IndexSummary {
        scan_mode: request.scan_mode,
        files_processed: report.index.files.len(),
        total_files: report.index.files.len(),
        codes_found: report.index.code_count(),
        index_sample: report.index.sample(SAMPLE_CODES),
        debug_log: report.log.head(SAMPLE_LOG_LINES),
    })
}

/// Merges the pages indexed for `request.order` into one PDF.
///
/// Uses the index persisted by the last [`index_workspace`] call.
pub fn merge_by_code(workspace: &Workspace, request: &MergeByCodeRequest) -> Result<MergeOutcome> {
    let index = workspace.load_index()?;
    let plan = plan_merge_by_code(&index, request)?;
    write_merge(workspace, &request.output_name, plan, CODE_MERGE_HINT)
}

/// Merges the numbered parts of each base in `request.bases` into one PDF.
pub fn merge_by_bases(
    workspace: &Workspace,
    request: &MergeByBaseRequest,
) -> Result<MergeOutcome> {
    let files = workspace.pdf_files()?;
    let plan = plan_merge_by_bases(&files, request)?;
    write_merge(workspace, &request.output_name, plan, BASE_MERGE_HINT)
}

fn write_merge(
    workspace: &Workspace,
    output_name: &str,
    plan: MergePlan,
    hint: &'static str,
) -> Result<MergeOutcome> {
    let output = safe_pdf_name(output_name);
    let mut log = Diagnostics::new();
    log.extend(plan.log);

    let summary: MergeSummary = assemble(
        &workspace.uploads_dir(),
        &plan.operations,
        &workspace.output_path(&output),
        &mut log,
    )
    .map_err(|e| match e {
        Error::NothingToMerge { .. } => Error::NothingToMerge { hint },
        e => e,
    })?;

    tracing::info!(
        "Wrote {} ({} pages, {} operations applied, {} dropped)",
        output,
        summary.pages_written,
        summary.operations_applied,
        summary.operations_dropped
    );

    Ok(MergeOutcome {
        output,
        pages: summary.pages_written,
        operations_applied: summary.operations_applied,
        skipped: plan.skipped,
        debug_log: log.lines().to_vec(),
    })
}
