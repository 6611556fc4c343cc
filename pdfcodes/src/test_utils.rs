use crate::converter::{PageSource, SourceLoader};
use anyhow::{anyhow, Result};
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream};
use std::collections::HashMap;
use std::path::Path;

/// Builds a PDF with one page per entry, each showing its text on one line.
pub fn create_text_pdf(pages: &[&str]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let page_tree_id = doc.new_object_id();

    let font_id = doc.add_object(lopdf::Dictionary::from_iter([
        ("Type", Object::Name(b"Font".to_vec())),
        ("Subtype", Object::Name(b"Type1".to_vec())),
        ("BaseFont", Object::Name(b"Helvetica".to_vec())),
        ("Encoding", Object::Name(b"WinAnsiEncoding".to_vec())),
    ]));
    let resources_id = doc.add_object(lopdf::Dictionary::from_iter([(
        "Font",
        Object::Dictionary(lopdf::Dictionary::from_iter([("F1", Object::Reference(font_id))])),
    )]));

    let mut kids = Vec::new();
    for text in pages {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 12.into()]),
                Operation::new("Td", vec![72.into(), 720.into()]),
                Operation::new("Tj", vec![Object::string_literal(*text)]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id =
            doc.add_object(Stream::new(lopdf::Dictionary::new(), content.encode().unwrap()));
        let page_id = doc.add_object(lopdf::Dictionary::from_iter([
            ("Type", Object::Name(b"Page".to_vec())),
            ("Parent", Object::Reference(page_tree_id)),
            ("Contents", Object::Reference(content_id)),
        ]));
        kids.push(Object::Reference(page_id));
    }

    let count = kids.len() as i64;
    let page_tree = lopdf::Dictionary::from_iter([
        ("Type", Object::Name(b"Pages".to_vec())),
        ("Kids", Object::Array(kids)),
        ("Count", Object::Integer(count)),
        ("Resources", Object::Reference(resources_id)),
        (
            "MediaBox",
            Object::Array(vec![0.into(), 0.into(), 612.into(), 792.into()]),
        ),
    ]);
    doc.objects.insert(page_tree_id, Object::Dictionary(page_tree));

    let catalog_id = doc.add_object(lopdf::Dictionary::from_iter([
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(page_tree_id)),
    ]));
    doc.trailer.set("Root", Object::Reference(catalog_id));

    let mut output = Vec::new();
    doc.save_to(&mut output).unwrap();
    output
}

/// Writes a text PDF into `dir` under `name`.
pub fn write_text_pdf(dir: &Path, name: &str, pages: &[&str]) {
    std::fs::write(dir.join(name), create_text_pdf(pages)).unwrap();
}

/// Extracted text of each page of a PDF file, in page order.
pub fn read_page_texts(path: &Path) -> Vec<String> {
    let doc = Document::load(path).unwrap();
    doc.get_pages().keys().map(|n| doc.extract_text(&[*n]).unwrap()).collect()
}

/// In-memory documents. A `None` page fails text extraction; an unknown file
/// fails to open.
#[derive(Debug, Clone, Default)]
pub struct MemoryLoader {
    files: HashMap<String, Vec<Option<String>>>,
}

impl MemoryLoader {
    pub fn new() -> MemoryLoader {
        MemoryLoader::default()
    }

    pub fn with_file(mut self, name: &str, pages: &[Option<&str>]) -> MemoryLoader {
        let pages = pages.iter().map(|p| p.map(str::to_string)).collect();
        self.files.insert(name.to_string(), pages);
        self
    }
}

struct MemoryDocument {
    pages: Vec<Option<String>>,
}

impl PageSource for MemoryDocument {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page_text(&self, index: usize) -> Result<String> {
        match self.pages.get(index) {
            Some(Some(text)) => Ok(text.clone()),
            Some(None) => Err(anyhow!("unreadable page")),
            None => Err(anyhow!("page {} does not exist", index + 1)),
        }
    }
}

impl SourceLoader for MemoryLoader {
    fn open(&self, file: &str) -> Result<Box<dyn PageSource>> {
        let pages = self.files.get(file).ok_or_else(|| anyhow!("cannot open {}", file))?;
        Ok(Box::new(MemoryDocument {
            pages: pages.clone(),
        }))
    }
}
