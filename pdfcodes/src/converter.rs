//! Turns PDF files into per-page text.
//!
//! Indexing only needs a page count and the extracted text of each page, so the
//! PDF library sits behind two small traits: [`SourceLoader`] opens a file by
//! name and [`PageSource`] exposes its pages. [`DirectoryLoader`] is the
//! `lopdf`-backed implementation used for workspaces.

use anyhow::{Context, Result};
use lopdf::Document;
use std::path::{Path, PathBuf};

/// A readable document: page count plus text per page.
pub trait PageSource {
    fn page_count(&self) -> usize;

    /// Extracted plain text of the 0-based page `index`.
    fn page_text(&self, index: usize) -> Result<String>;
}

/// Opens documents by file name.
pub trait SourceLoader: Send + Sync {
    fn open(&self, file: &str) -> Result<Box<dyn PageSource>>;
}

/// A PDF loaded with `lopdf`.
pub struct PdfDocument {
    doc: Document,
    page_numbers: Vec<u32>,
}

impl PdfDocument {
    pub fn open(path: &Path) -> Result<PdfDocument> {
        let doc = Document::load(path).with_context(|| format!("cannot open {}", path.display()))?;
        Ok(PdfDocument::from_document(doc))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<PdfDocument> {
        let doc = Document::load_mem(bytes).context("invalid pdf")?;
        Ok(PdfDocument::from_document(doc))
    }

    fn from_document(doc: Document) -> PdfDocument {
        // get_pages is keyed by 1-based page number, already in order
        let page_numbers = doc.get_pages().keys().copied().collect();
        PdfDocument { doc, page_numbers }
    }
}

impl PageSource for PdfDocument {
    fn page_count(&self) -> usize {
        self.page_numbers.len()
    }

    fn page_text(&self, index: usize) -> Result<String> {
        let number = self
            .page_numbers
            .get(index)
            .copied()
            .ok_or_else(|| anyhow::anyhow!("page {} does not exist", index + 1))?;
        let text = self.doc.extract_text(&[number])?;
        return Ok(text);
    }
}

/// Loads PDFs from one directory.
#[derive(Debug, Clone)]
pub struct DirectoryLoader {
    dir: PathBuf,
}

impl DirectoryLoader {
    pub fn new(dir: impl Into<PathBuf>) -> DirectoryLoader {
        DirectoryLoader { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl SourceLoader for DirectoryLoader {
    fn open(&self, file: &str) -> Result<Box<dyn PageSource>> {
        let doc = PdfDocument::open(&self.dir.join(file))?;
        Ok(Box::new(doc))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::create_text_pdf;

    #[test]
    fn test_pdf_document_pages_and_text() {
        let bytes = create_text_pdf(&["ref MIA-000123 end", "second page AB-77"]);
        let doc = PdfDocument::from_bytes(&bytes).unwrap();
        assert_eq!(doc.page_count(), 2);
        assert!(doc.page_text(0).unwrap().contains("MIA-000123"));
        assert!(doc.page_text(1).unwrap().contains("AB-77"));
        assert!(doc.page_text(2).is_err());
    }

    #[test]
    fn test_directory_loader() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("one.pdf"), create_text_pdf(&["XY-1"])).unwrap();
        std::fs::write(dir.path().join("broken.pdf"), b"not a pdf").unwrap();

        let loader = DirectoryLoader::new(dir.path());
        assert_eq!(loader.open("one.pdf").unwrap().page_count(), 1);
        assert!(loader.open("broken.pdf").is_err());
        assert!(loader.open("missing.pdf").is_err());
    }

    #[test]
    fn test_invalid_bytes() {
        assert!(PdfDocument::from_bytes(b"").is_err());
    }
}
