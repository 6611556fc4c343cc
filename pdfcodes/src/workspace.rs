//! On-disk workspaces.
//!
//! A workspace is one directory under a storage root:
//!
//! ```text
//! <storage>/<workspace_id>/
//!     uploads/          uploaded PDFs, the indexed file set
//!     index.json        last built index
//!     debug_log.txt     trace of the last index build
//!     <output>.pdf      merge results
//! ```
//!
//! Concurrent access to one workspace is not coordinated; the last writer wins.

use glob::{glob_with, MatchOptions, Pattern};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::config::ScanMode;
use crate::error::{Error, Result};
use crate::models::{Diagnostics, Index};

pub const UPLOADS_DIR: &str = "uploads";
pub const INDEX_FILE: &str = "index.json";
pub const DEBUG_LOG_FILE: &str = "debug_log.txt";

const FALLBACK_OUTPUT_NAME: &str = "output.pdf";

/// Listing entry for one workspace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceInfo {
    pub workspace_id: String,
    pub has_index: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workspace {
    id: String,
    root: PathBuf,
}

/// Sanitizes a user-supplied file name: trims it, replaces path separators
/// with `_` and makes sure it ends with `.pdf`.
///
/// # Examples
///
/// ```
/// use pdfcodes::workspace::safe_pdf_name;
///
/// assert_eq!(safe_pdf_name(" out/put "), "out_put.pdf");
/// assert_eq!(safe_pdf_name("Report.PDF"), "Report.PDF");
/// ```
pub fn safe_pdf_name(name: &str) -> String {
    let name = name.trim().replace(['/', '\\'], "_");
    if name.is_empty() {
        return FALLBACK_OUTPUT_NAME.to_string();
    }
    if has_pdf_extension(&name) {
        name
    } else {
        format!("{}.pdf", name)
    }
}

fn has_pdf_extension(name: &str) -> bool {
    name.to_lowercase().ends_with(".pdf")
}

fn new_workspace_id() -> String {
    let mut rng = rand::rng();
    format!("{:010x}", rng.random_range(0..(1u64 << 40)))
}

impl Workspace {
    /// Creates a new, empty workspace under `storage`.
    pub fn create(storage: &Path) -> Result<Workspace> {
        let mut id = new_workspace_id();
        while storage.join(&id).exists() {
            id = new_workspace_id();
        }
        let workspace = Workspace {
            root: storage.join(&id),
            id,
        };
        std::fs::create_dir_all(workspace.uploads_dir())?;
        tracing::info!("Created workspace {}", workspace.root.display());
        Ok(workspace)
    }

    /// Opens an existing workspace directory.
    pub fn open(dir: &Path) -> Result<Workspace> {
        if !dir.is_dir() {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("workspace not found: {}", dir.display()),
            )));
        }
        let id = dir
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        std::fs::create_dir_all(dir.join(UPLOADS_DIR))?;
        Ok(Workspace {
            id,
            root: dir.to_path_buf(),
        })
    }

    /// Lists the workspaces under `storage`, sorted by id. A missing storage
    /// directory has no workspaces.
    pub fn list(storage: &Path) -> Result<Vec<WorkspaceInfo>> {
        if !storage.exists() {
            return Ok(Vec::new());
        }
        let mut workspaces = Vec::new();
        for entry in std::fs::read_dir(storage)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            workspaces.push(WorkspaceInfo {
                workspace_id: entry.file_name().to_string_lossy().to_string(),
                has_index: entry.path().join(INDEX_FILE).is_file(),
            });
        }
        workspaces.sort_by(|a, b| a.workspace_id.cmp(&b.workspace_id));
        Ok(workspaces)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn uploads_dir(&self) -> PathBuf {
        self.root.join(UPLOADS_DIR)
    }

    pub fn index_path(&self) -> PathBuf {
        self.root.join(INDEX_FILE)
    }

    pub fn debug_log_path(&self) -> PathBuf {
        self.root.join(DEBUG_LOG_FILE)
    }

    /// Path of a merge output, with the name sanitized.
    pub fn output_path(&self, name: &str) -> PathBuf {
        self.root.join(safe_pdf_name(name))
    }

    /// Copies a PDF into `uploads/`.
    ///
    /// # Returns
    ///
    /// The name the file is stored under.
    ///
    /// # Errors
    ///
    /// [`Error::NotPdf`] when the file name does not end with `.pdf`.
    pub fn add_file(&self, path: &Path) -> Result<String> {
        let original = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let name = original.trim().replace(['/', '\\'], "_");
        if name.is_empty() || !has_pdf_extension(&name) {
            return Err(Error::NotPdf(original));
        }
        std::fs::copy(path, self.uploads_dir().join(&name))?;
        tracing::info!("Uploaded {} to workspace {}", name, self.id);
        Ok(name)
    }

    /// Names of the uploaded PDFs, sorted case-insensitively.
    pub fn pdf_files(&self) -> Result<Vec<String>> {
        let pattern = format!("{}/*.pdf", Pattern::escape(&self.uploads_dir().to_string_lossy()));
        let options = MatchOptions {
            case_sensitive: false,
            ..MatchOptions::new()
        };
        let paths = glob_with(&pattern, options).map_err(anyhow::Error::from)?;

        let mut files = Vec::new();
        for path in paths {
            let path = path.map_err(std::io::Error::from)?;
            if !path.is_file() {
                continue;
            }
            if let Some(name) = path.file_name() {
                files.push(name.to_string_lossy().to_string());
            }
        }
        files.sort_by_cached_key(|f| f.to_lowercase());
        Ok(files)
    }

    /// Loads `index.json`; a workspace that was never indexed has an empty index.
    pub fn load_index(&self) -> Result<Index> {
        let path = self.index_path();
        if !path.exists() {
            return Ok(Index::default());
        }
        let text = std::fs::read_to_string(path)?;
        let index = serde_json::from_str(&text)?;
        Ok(index)
    }

    /// Replaces `index.json` with `index`.
    pub fn save_index(&self, index: &Index) -> Result<()> {
        let text = serde_json::to_string_pretty(index)?;
        std::fs::write(self.index_path(), text)?;
        Ok(())
    }

    /// Replaces `debug_log.txt` with the trace of an index build.
    pub fn write_debug_log(&self, mode: ScanMode, pattern: &str, log: &Diagnostics) -> Result<()> {
        let mut text = String::new();
        text.push_str(&format!("Generated: {}\n", chrono::Local::now().to_rfc3339()));
        text.push_str(&format!("Mode: {}\n", mode));
        text.push_str(&format!("Pattern: {}\n", pattern));
        text.push_str(&"=".repeat(50));
        text.push('\n');
        for line in log.lines() {
            text.push_str(line);
            text.push('\n');
        }
        std::fs::write(self.debug_log_path(), text)?;
        return Ok(());
    }
}
