//! Reads the paragraph/table structure of a `.docx` file.
//!
//! Only what note extraction needs is kept: top-level body paragraphs, top-level
//! tables, and per-run bold flags.

mod xml;

use std::fs::File;
use std::io::{BufReader, Cursor, Read, Seek};
use std::path::Path;

use zip::result::ZipError;
use zip::ZipArchive;

use crate::notes::ParagraphBlock;

const DOCUMENT_PART: &str = "word/document.xml";

#[derive(Debug, thiserror::Error)]
pub enum DocxError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("not a docx container: {0}")]
    Archive(#[from] ZipError),
    #[error("docx has no {0} part")]
    MissingPart(&'static str),
    #[error("malformed document xml: {0}")]
    Xml(String),
}

#[derive(Debug, Clone, Default)]
pub struct TableCell {
    pub paragraphs: Vec<ParagraphBlock>,
}

#[derive(Debug, Clone, Default)]
pub struct Table {
    pub rows: Vec<Vec<TableCell>>,
}

#[derive(Debug, Clone, Default)]
pub struct Document {
    /// Direct children of `w:body`, in order.
    pub paragraphs: Vec<ParagraphBlock>,
    /// Top-level tables only; nested tables are not visited.
    pub tables: Vec<Table>,
}

impl Document {
    pub fn open(path: &Path) -> Result<Self, DocxError> {
        let file = File::open(path)?;
        Self::from_archive(ZipArchive::new(BufReader::new(file))?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DocxError> {
        Self::from_archive(ZipArchive::new(Cursor::new(bytes))?)
    }

    fn from_archive<R: Read + Seek>(mut archive: ZipArchive<R>) -> Result<Self, DocxError> {
        let mut document_xml = String::new();
        match archive.by_name(DOCUMENT_PART) {
            Ok(mut part) => {
                part.read_to_string(&mut document_xml)?;
            }
            Err(ZipError::FileNotFound) => return Err(DocxError::MissingPart(DOCUMENT_PART)),
            Err(e) => return Err(e.into()),
        }
        xml::parse_document_xml(&document_xml)
    }

    /// Cell paragraphs of every table, row-major then column order.
    pub fn table_paragraphs(&self) -> impl Iterator<Item = &ParagraphBlock> {
        self.tables
            .iter()
            .flat_map(|t| t.rows.iter())
            .flatten()
            .flat_map(|cell| cell.paragraphs.iter())
    }

    /// The stream note segmentation runs over: all table paragraphs, then the body.
    ///
    /// Case files usually keep their notes in a table, and segmentation state carries
    /// from the last table paragraph into the first body paragraph.
    pub fn note_stream(&self) -> impl Iterator<Item = &ParagraphBlock> {
        self.table_paragraphs().chain(self.paragraphs.iter())
    }

    pub fn contains_text(&self, needle: &str) -> bool {
        self.note_stream().any(|p| p.full_text.contains(needle))
    }
}

/// `.docx` by extension (any case), excluding Word's `~$` lock files.
pub fn is_docx_path(path: &Path) -> bool {
    let is_lock = path
        .file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with("~$"));
    let ext_ok = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("docx"));
    ext_ok && !is_lock
}
