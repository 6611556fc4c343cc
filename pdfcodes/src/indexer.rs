//! Index builders.
//!
//! Three strategies produce a [`CodeMap`]:
//! - filename: codes from each file name, one hit per file and code,
//! - content: codes from the text of every scanned page, one hit per page,
//! - hybrid: both, with filename hits taking precedence over content hits of
//!   the same file.
//!
//! Files are scanned concurrently on the blocking pool, but results are merged
//! in input order, so the hit order is the same as a sequential scan.

use futures::stream::{self, StreamExt};
use indicatif::ProgressBar;
use std::sync::Arc;

use crate::config::{IndexRequest, ScanMode};
use crate::converter::SourceLoader;
use crate::error::{Error, Result};
use crate::extracter::{extract_content_codes, extract_filename_codes, ContentPattern};
use crate::models::{CodeMap, Diagnostics, Hit, Index};

/// Number of files scanned at the same time.
const SCAN_CONCURRENCY: usize = 4;

/// Result of a full index build.
#[derive(Debug, Clone)]
pub struct IndexReport {
    pub index: Index,
    pub log: Diagnostics,
}

/// Result of scanning one file's content.
#[derive(Debug)]
enum FileScan {
    Scanned {
        file: String,
        /// `(code, page)` pairs in page order, codes unique per page.
        hits: Vec<(String, usize)>,
        log: Diagnostics,
    },
    Failed {
        file: String,
        reason: String,
    },
}

/// Builds the filename index of `files`.
///
/// # Arguments
///
/// * `files` - File names, in index order.
///
/// # Returns
///
/// The code map and the trace of the pass.
pub fn build_filename_index(files: &[String]) -> (CodeMap, Diagnostics) {
    let mut by_code = CodeMap::new();
    let mut log = Diagnostics::new();

    for file in files {
        let codes = extract_filename_codes(file);
        for code in codes.iter() {
            let hits = by_code.entry(code.clone()).or_default();
            if !hits.iter().any(|h| h.file == *file) {
                hits.push(Hit::filename(file));
            }
        }
        if !codes.is_empty() {
            log.info(format!("File {}: {} codes found in name", file, codes.len()));
        }
    }

    return (by_code, log);
}

fn scan_file(
    loader: &dyn SourceLoader,
    file: &str,
    pattern: &ContentPattern,
    max_pages: usize,
) -> FileScan {
    let source = match loader.open(file) {
        Ok(source) => source,
        Err(e) => {
            return FileScan::Failed {
                file: file.to_string(),
                reason: format!("{:#}", e),
            }
        }
    };

    let total = source.page_count();
    let page_count = total.min(max_pages);
    let mut log = Diagnostics::new();
    log.info(format!("Processing {}: {} pages total, scanning {}", file, total, page_count));

    let mut hits = Vec::new();
    for page in 0..page_count {
        match source.page_text(page) {
            Ok(text) => {
                for code in extract_content_codes(&text, pattern) {
                    tracing::debug!("{} page {}: {}", file, page + 1, code);
                    hits.push((code, page));
                }
            }
            Err(e) => {
                log.warn(format!("Error on page {} of {}: {:#}", page + 1, file, e));
            }
        }
    }

    FileScan::Scanned {
        file: file.to_string(),
        hits,
        log,
    }
}

/// Builds the content index of `files`.
///
/// An invalid `pattern` falls back to the default pattern. Files that cannot
/// be opened and pages whose text cannot be extracted are logged and
/// contribute no hits.
///
/// # Arguments
///
/// * `files` - File names, in index order.
/// * `loader` - Opens a file name as a page source.
/// * `pattern` - Content pattern as supplied by the caller.
/// * `max_pages` - Pages scanned per file.
/// * `verbose` - Show a progress bar over the files.
///
/// # Errors
///
/// Only fails when a scan task panics or is cancelled.
pub async fn build_content_index(
    files: &[String],
    loader: Arc<dyn SourceLoader>,
    pattern: &str,
    max_pages: usize,
    verbose: bool,
) -> Result<(CodeMap, Diagnostics)> {
    let mut by_code = CodeMap::new();
    let mut log = Diagnostics::new();

    let pattern = ContentPattern::compile(pattern);
    if let Some(reason) = &pattern.fallback {
        log.warn(format!("Invalid content pattern: {}", reason));
        log.info("Using the default generic code pattern");
    }
    let pattern = Arc::new(pattern);

    let bar = if verbose { ProgressBar::new(files.len() as u64) } else { ProgressBar::hidden() };
    let scans: Vec<_> = stream::iter(files.iter().cloned())
        .map(|file| {
            let loader = Arc::clone(&loader);
            let pattern = Arc::clone(&pattern);
            tokio::task::spawn_blocking(move || {
                scan_file(loader.as_ref(), &file, &pattern, max_pages)
            })
        })
        .buffered(SCAN_CONCURRENCY)
        .inspect(|_| bar.inc(1))
        .collect()
        .await;
    bar.finish_and_clear();

    for scan in scans {
        let scan = scan.map_err(|e| Error::Internal(anyhow::Error::new(e)))?;
        match scan {
            FileScan::Scanned {
                file,
                hits,
                log: file_log,
            } => {
                log.extend(file_log);
                let mut file_codes: Vec<&str> = Vec::new();
                for (code, page) in hits.iter() {
                    by_code.entry(code.clone()).or_default().push(Hit::content(&file, *page));
                    if !file_codes.contains(&code.as_str()) {
                        file_codes.push(code);
                    }
                }
                if !file_codes.is_empty() {
                    log.info(format!(
                        "File {}: {} codes found in content",
                        file,
                        file_codes.len()
                    ));
                }
            }
            FileScan::Failed { file, reason } => {
                log.warn(format!("Error processing file {}: {}", file, reason));
            }
        }
    }

    return Ok((by_code, log));
}

/// Unions a filename map and a content map.
///
/// Filename hits come first. A content hit is admitted only if the code has
/// no hit yet for the same file, whatever its source; this includes content
/// hits admitted earlier, so at most one hit per file and code survives.
pub fn combine_hybrid(by_filename: CodeMap, by_content: CodeMap) -> CodeMap {
    let mut combined = by_filename;
    for (code, hits) in by_content {
        let entry = combined.entry(code).or_default();
        for hit in hits {
            if !entry.iter().any(|h| h.file == hit.file) {
                entry.push(hit);
            }
        }
    }
    combined
}

/// Builds the hybrid (filename + content) index of `files`.
pub async fn build_hybrid_index(
    files: &[String],
    loader: Arc<dyn SourceLoader>,
    pattern: &str,
    max_pages: usize,
    verbose: bool,
) -> Result<(CodeMap, Diagnostics)> {
    let mut log = Diagnostics::new();
    log.info("=== Hybrid mode: combining filename + content ===");

    log.info("1. Processing file names...");
    let (by_filename, filename_log) = build_filename_index(files);
    log.extend(filename_log);

    log.info("2. Processing PDF content...");
    let (by_content, content_log) =
        build_content_index(files, loader, pattern, max_pages, verbose).await?;
    log.extend(content_log);

    log.info("3. Combining results...");
    let filename_codes = by_filename.len();
    let content_codes = by_content.len();
    let combined = combine_hybrid(by_filename, by_content);

    log.info(format!("Summary: {} unique codes found", combined.len()));
    log.info(format!("  - Codes in names: {}", filename_codes));
    log.info(format!("  - Codes in content: {}", content_codes));
    log.info(format!("  - Combined total: {}", combined.len()));

    return Ok((combined, log));
}

/// Builds the index of `files` for the requested scan mode.
///
/// # Arguments
///
/// * `files` - File names, in index order.
/// * `request` - Pattern, scan mode and page limit.
/// * `loader` - Opens a file name as a page source.
/// * `verbose` - Show progress while scanning content.
///
/// # Errors
///
/// [`Error::NoFiles`] when `files` is empty.
pub async fn build_index(
    files: Vec<String>,
    request: &IndexRequest,
    loader: Arc<dyn SourceLoader>,
    verbose: bool,
) -> Result<IndexReport> {
    if files.is_empty() {
        return Err(Error::NoFiles);
    }

    let time = std::time::Instant::now();
    let (by_code, log) = match request.scan_mode {
        ScanMode::Filename => build_filename_index(&files),
        ScanMode::Content => {
            build_content_index(&files, loader, &request.pattern, request.max_pages, verbose)
                .await?
        }
        ScanMode::Both => {
            build_hybrid_index(&files, loader, &request.pattern, request.max_pages, verbose)
                .await?
        }
    };

    if verbose {
        tracing::info!(
            "Indexed {} files ({}) in {:.2}s, {} codes",
            files.len(),
            request.scan_mode,
            time.elapsed().as_secs_f64(),
            by_code.len()
        );
    }

    Ok(IndexReport {
        index: Index::new(files, by_code),
        log,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::converter::DirectoryLoader;
    use crate::extracter::DEFAULT_CODE_PATTERN;
    use crate::models::HitSource;
    use crate::test_utils::{write_text_pdf, MemoryLoader};

    fn names(files: &[&str]) -> Vec<String> {
        files.iter().map(|f| f.to_string()).collect()
    }

    #[test]
    fn test_filename_index() {
        let (by_code, log) = build_filename_index(&names(&["AB1-001.pdf", "BC2_2.pdf"]));

        assert_eq!(by_code.len(), 2);
        assert_eq!(by_code["AB1"], vec![Hit::filename("AB1-001.pdf")]);
        assert_eq!(by_code["BC2"], vec![Hit::filename("BC2_2.pdf")]);
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn test_filename_index_needs_two_letters() {
        let (by_code, log) = build_filename_index(&names(&["A1-001.pdf", "B2_2.pdf"]));
        assert!(by_code.is_empty());
        assert!(log.is_empty());
    }

    #[test]
    fn test_filename_index_one_hit_per_file() {
        let files = names(&["MIA100 copy of mia-100.pdf", "MIA100_1.pdf", "nothing.pdf"]);
        let (by_code, _) = build_filename_index(&files);

        assert_eq!(by_code.len(), 1);
        assert_eq!(
            by_code["MIA100"],
            vec![Hit::filename("MIA100 copy of mia-100.pdf"), Hit::filename("MIA100_1.pdf")]
        );
    }

    #[test_log::test(tokio::test)]
    async fn test_content_index_keeps_every_page() {
        let loader = MemoryLoader::new()
            .with_file("a.pdf", &[Some("MIA-1 and XY-2"), Some("nothing"), Some("mia 1 again")])
            .with_file("b.pdf", &[Some("XY_2")]);
        let (by_code, _) = build_content_index(
            &names(&["a.pdf", "b.pdf"]),
            Arc::new(loader),
            DEFAULT_CODE_PATTERN,
            100,
            false,
        )
        .await
        .unwrap();

        assert_eq!(by_code.keys().collect::<Vec<_>>(), vec!["MIA1", "XY2"]);
        assert_eq!(by_code["MIA1"], vec![Hit::content("a.pdf", 0), Hit::content("a.pdf", 2)]);
        assert_eq!(by_code["XY2"], vec![Hit::content("a.pdf", 0), Hit::content("b.pdf", 0)]);
    }

    #[test_log::test(tokio::test)]
    async fn test_content_index_respects_max_pages() {
        let loader = MemoryLoader::new().with_file("a.pdf", &[Some("AA1"), Some("BB2"), Some("CC3")]);
        let files = names(&["a.pdf"]);
        let loader: Arc<dyn SourceLoader> = Arc::new(loader);

        let (by_code, log) =
            build_content_index(&files, Arc::clone(&loader), "", 2, false).await.unwrap();
        assert_eq!(by_code.keys().collect::<Vec<_>>(), vec!["AA1", "BB2"]);
        assert!(log.lines().iter().any(|l| l == "Processing a.pdf: 3 pages total, scanning 2"));

        let (by_code, _) = build_content_index(&files, loader, "", 0, false).await.unwrap();
        assert!(by_code.is_empty());
    }

    #[test_log::test(tokio::test)]
    async fn test_content_index_recovers_from_failures() {
        let loader = MemoryLoader::new()
            .with_file("a.pdf", &[None, Some("ZZ-9")])
            .with_file("c.pdf", &[Some("ZZ 9")]);
        let (by_code, log) = build_content_index(
            &names(&["a.pdf", "missing.pdf", "c.pdf"]),
            Arc::new(loader),
            DEFAULT_CODE_PATTERN,
            10,
            false,
        )
        .await
        .unwrap();

        assert_eq!(by_code["ZZ9"], vec![Hit::content("a.pdf", 1), Hit::content("c.pdf", 0)]);
        assert!(log.lines().iter().any(|l| l.starts_with("Error on page 1 of a.pdf")));
        assert!(log.lines().iter().any(|l| l.starts_with("Error processing file missing.pdf")));
    }

    #[test_log::test(tokio::test)]
    async fn test_content_index_invalid_pattern_falls_back() {
        let loader = MemoryLoader::new().with_file("a.pdf", &[Some("ref MIA-000123 end")]);
        let (by_code, log) =
            build_content_index(&names(&["a.pdf"]), Arc::new(loader), "MIA(\\d+", 10, false)
                .await
                .unwrap();

        assert_eq!(by_code["MIA000123"], vec![Hit::content("a.pdf", 0)]);
        assert!(log.lines()[0].starts_with("Invalid content pattern"));
        assert_eq!(log.lines()[1], "Using the default generic code pattern");
    }

    #[test_log::test(tokio::test)]
    async fn test_content_index_order_is_deterministic() {
        let mut loader = MemoryLoader::new();
        let mut files = Vec::new();
        for i in 0..12 {
            let name = format!("f{:02}.pdf", i);
            loader = loader.with_file(&name, &[Some("common CODE-1"), Some("CODE 1")]);
            files.push(name);
        }
        let (by_code, _) =
            build_content_index(&files, Arc::new(loader), "", 10, false).await.unwrap();

        let expected: Vec<Hit> = files
            .iter()
            .flat_map(|f| vec![Hit::content(f, 0), Hit::content(f, 1)])
            .collect();
        assert_eq!(by_code["CODE1"], expected);
    }

    #[test]
    fn test_combine_hybrid_prefers_filename_hits() {
        let mut by_filename = CodeMap::new();
        by_filename.insert("MIA1".to_string(), vec![Hit::filename("MIA1.pdf")]);
        let mut by_content = CodeMap::new();
        by_content.insert(
            "MIA1".to_string(),
            vec![Hit::content("MIA1.pdf", 0), Hit::content("other.pdf", 4)],
        );
        by_content.insert(
            "XY2".to_string(),
            vec![Hit::content("other.pdf", 1), Hit::content("other.pdf", 3)],
        );

        let combined = combine_hybrid(by_filename, by_content);

        assert_eq!(combined["MIA1"], vec![Hit::filename("MIA1.pdf"), Hit::content("other.pdf", 4)]);
        assert_eq!(combined["XY2"], vec![Hit::content("other.pdf", 1)]);
    }

    #[test_log::test(tokio::test)]
    async fn test_hybrid_index_never_duplicates_a_file() {
        let loader = MemoryLoader::new()
            .with_file("MIA-1.pdf", &[Some("MIA 1"), Some("MIA 1")])
            .with_file("scan.pdf", &[Some("text"), Some("MIA_1")]);
        let (by_code, log) = build_hybrid_index(
            &names(&["MIA-1.pdf", "scan.pdf"]),
            Arc::new(loader),
            DEFAULT_CODE_PATTERN,
            10,
            false,
        )
        .await
        .unwrap();

        let hits = &by_code["MIA1"];
        assert_eq!(hits, &vec![Hit::filename("MIA-1.pdf"), Hit::content("scan.pdf", 1)]);
        assert_eq!(hits.iter().filter(|h| h.file == "MIA-1.pdf").count(), 1);
        assert_eq!(hits[0].source, HitSource::Filename);
        assert_eq!(log.lines()[0], "=== Hybrid mode: combining filename + content ===");
    }

    #[test_log::test(tokio::test)]
    async fn test_build_index_rejects_empty_file_set() {
        let res = build_index(
            Vec::new(),
            &IndexRequest::default(),
            Arc::new(MemoryLoader::new()),
            false,
        )
        .await;
        assert!(matches!(res, Err(Error::NoFiles)));
    }

    #[test_log::test(tokio::test)]
    async fn test_build_index_filename_mode_round_trip() {
        let request = IndexRequest {
            scan_mode: ScanMode::Filename,
            ..IndexRequest::default()
        };
        let files = names(&["AB1-001.pdf", "BC2_2.pdf"]);
        let report = build_index(files.clone(), &request, Arc::new(MemoryLoader::new()), false)
            .await
            .unwrap();

        assert_eq!(report.index.files, files);
        assert_eq!(report.index.hits("AB1"), [Hit::filename("AB1-001.pdf")]);
        assert_eq!(report.index.hits("BC2"), [Hit::filename("BC2_2.pdf")]);
    }

    #[test_log::test(tokio::test)]
    async fn test_build_index_on_real_pdfs() {
        let dir = tempfile::tempdir().unwrap();
        write_text_pdf(dir.path(), "report.pdf", &["intro", "ref MIA-000123 end"]);
        write_text_pdf(dir.path(), "MIA000123_0.pdf", &["cover"]);

        let request = IndexRequest::default();
        let files = names(&["MIA000123_0.pdf", "report.pdf"]);
        let report =
            build_index(files, &request, Arc::new(DirectoryLoader::new(dir.path())), true)
                .await
                .unwrap();

        assert_eq!(
            report.index.hits("MIA000123"),
            [Hit::filename("MIA000123_0.pdf"), Hit::content("report.pdf", 1)]
        );
    }
}
