//! Page assembler: applies copy operations to real PDFs with `lopdf`.
//!
//! Each operation loads a fresh copy of its source document, renumbers its
//! objects past everything imported so far, and keeps the selected pages
//! plus all non page-tree objects. Unused objects are pruned when the output
//! is written. Copying the same page twice therefore yields two independent
//! pages.

use lopdf::{Dictionary, Document, Object, ObjectId};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::models::{Diagnostics, Operation};

/// Page attributes a page may inherit from its ancestors in the page tree.
const INHERITABLE: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Guards against malformed, cyclic page trees.
const MAX_TREE_DEPTH: usize = 64;

/// What an assembly wrote.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MergeSummary {
    pub pages_written: usize,
    pub operations_applied: usize,
    pub operations_dropped: usize,
}

/// Accumulates copied pages for one output document.
pub struct PageAssembler {
    dir: PathBuf,
    sources: HashMap<String, Vec<u8>>,
    max_id: u32,
    pages: Vec<(ObjectId, Dictionary)>,
    objects: BTreeMap<ObjectId, Object>,
}

impl PageAssembler {
    /// Creates an assembler reading source files from `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> PageAssembler {
        PageAssembler {
            dir: dir.into(),
            sources: HashMap::new(),
            max_id: 1,
            pages: Vec::new(),
            objects: BTreeMap::new(),
        }
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn load(&mut self, file: &str) -> Result<Document> {
        if !self.sources.contains_key(file) {
            let bytes = std::fs::read(self.dir.join(file))?;
            self.sources.insert(file.to_string(), bytes);
        }
        let doc = Document::load_mem(&self.sources[file])?;
        Ok(doc)
    }

    /// Applies one operation.
    ///
    /// # Returns
    ///
    /// The number of pages copied.
    ///
    /// # Errors
    ///
    /// [`Error::PageOutOfRange`] if a `CopyPage` index is past the end of its
    /// document; nothing is copied in that case. I/O and PDF errors otherwise.
    pub fn apply(&mut self, operation: &Operation) -> Result<usize> {
        let mut doc = self.load(operation.file())?;
        let page_count = doc.get_pages().len();

        let positions: Vec<usize> = match operation {
            Operation::CopyPage { file, page } => {
                if *page >= page_count {
                    return Err(Error::PageOutOfRange {
                        file: file.clone(),
                        page: *page,
                        page_count,
                    });
                }
                vec![*page]
            }
            Operation::CopyWholeDocument { .. } => (0..page_count).collect(),
        };

        // page order comes from the page tree, not object ids
        doc.renumber_objects_with(self.max_id);
        self.max_id = doc.max_id + 1;
        let page_ids: Vec<ObjectId> = doc.get_pages().into_values().collect();

        for position in positions.iter() {
            let id = page_ids[*position];
            let page = flatten_page(&doc, id)?;
            self.pages.push((id, page));
        }

        for (id, object) in doc.objects.into_iter() {
            match object.type_name().unwrap_or("") {
                "Catalog" | "Pages" | "Page" | "Outlines" | "Outline" => {}
                _ => {
                    self.objects.insert(id, object);
                }
            }
        }

        Ok(positions.len())
    }

    /// Builds the output document from every page copied so far.
    ///
    /// # Errors
    ///
    /// [`Error::NothingToMerge`] when no page was copied.
    pub fn finish(self) -> Result<Document> {
        if self.pages.is_empty() {
            return Err(Error::NothingToMerge {
                hint: "requested pages",
            });
        }

        let mut document = Document::with_version("1.5");
        document.objects = self.objects;
        document.max_id = self.max_id;

        let pages_id = document.new_object_id();
        let mut kids = Vec::with_capacity(self.pages.len());
        for (id, mut page) in self.pages.into_iter() {
            page.set("Parent", Object::Reference(pages_id));
            document.objects.insert(id, Object::Dictionary(page));
            kids.push(Object::Reference(id));
        }

        let count = kids.len() as i64;
        let pages = Dictionary::from_iter([
            ("Type", Object::Name(b"Pages".to_vec())),
            ("Kids", Object::Array(kids)),
            ("Count", Object::Integer(count)),
        ]);
        document.objects.insert(pages_id, Object::Dictionary(pages));

        let catalog_id = document.add_object(Dictionary::from_iter([
            ("Type", Object::Name(b"Catalog".to_vec())),
            ("Pages", Object::Reference(pages_id)),
        ]));
        document.trailer.set("Root", Object::Reference(catalog_id));

        document.prune_objects();
        document.renumber_objects();
        document.compress();
        Ok(document)
    }
}

/// Returns the page dictionary with inherited attributes copied in, so it can
/// live under a new parent.
fn flatten_page(doc: &Document, page_id: ObjectId) -> Result<Dictionary> {
    let mut page = doc.get_dictionary(page_id)?.clone();
    let mut parent = page.get(b"Parent").and_then(Object::as_reference).ok();
    let mut depth = 0;

    while let Some(parent_id) = parent {
        if depth >= MAX_TREE_DEPTH {
            break;
        }
        let Ok(node) = doc.get_dictionary(parent_id) else {
            break;
        };
        for key in INHERITABLE {
            if !page.has(key) {
                if let Ok(value) = node.get(key) {
                    page.set(key.to_vec(), value.clone());
                }
            }
        }
        parent = node.get(b"Parent").and_then(Object::as_reference).ok();
        depth += 1;
    }

    Ok(page)
}

/// Applies `operations` in order and writes the result to `output`.
///
/// Operations pointing past the end of their document are dropped and
/// logged; any other failure aborts before anything is written.
///
/// # Arguments
///
/// * `dir` - Directory holding the source files.
/// * `operations` - The planned operations.
/// * `output` - Path of the PDF to write.
/// * `log` - Receives one line per dropped operation.
pub fn assemble(
    dir: &Path,
    operations: &[Operation],
    output: &Path,
    log: &mut Diagnostics,
) -> Result<MergeSummary> {
    let mut assembler = PageAssembler::new(dir);
    let mut summary = MergeSummary::default();

    for operation in operations {
        match assembler.apply(operation) {
            Ok(_) => summary.operations_applied += 1,
            Err(e @ Error::PageOutOfRange { .. }) => {
                log.warn(format!("Skipping operation: {}", e));
                summary.operations_dropped += 1;
            }
            Err(e) => return Err(e),
        }
    }

    summary.pages_written = assembler.page_count();
    let mut document = assembler.finish()?;
    let mut bytes = Vec::new();
    document.save_to(&mut bytes)?;
    std::fs::write(output, bytes)?;

    return Ok(summary);
}
