pub mod segment;

pub use segment::{segment, SECTION_MARKER};

/// A formatting run inside a paragraph.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Run {
    pub text: String,
    pub bold: bool,
}

#[cfg(test)]
impl Run {
    pub fn bold(text: &str) -> Self {
        Run { text: text.to_string(), bold: true }
    }

    pub fn plain(text: &str) -> Self {
        Run { text: text.to_string(), bold: false }
    }
}

/// One paragraph as read from a document, either top-level or inside a table cell.
///
/// `full_text` can hold more than the concatenated `runs` (hyperlink text is part of
/// the paragraph text but not of its direct runs).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParagraphBlock {
    pub full_text: String,
    pub runs: Vec<Run>,
}

#[cfg(test)]
impl ParagraphBlock {
    /// Build a paragraph whose text is exactly the concatenation of its runs.
    pub fn from_runs(runs: Vec<Run>) -> Self {
        let full_text = runs.iter().map(|r| r.text.as_str()).collect();
        ParagraphBlock { full_text, runs }
    }

    pub fn plain(text: &str) -> Self {
        Self::from_runs(vec![Run::plain(text)])
    }
}

/// A single dated case note.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteRecord {
    pub date: String,
    pub staff: String,
    pub body: String,
}
