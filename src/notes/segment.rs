use std::sync::LazyLock;

use regex::Regex;

use super::{NoteRecord, ParagraphBlock};

/// Paragraph text that opens the notes section of a case file.
pub const SECTION_MARKER: &str = "Case Notes:";

static DATE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d{1,2}/+\d{1,2}/+\d{2,4}").unwrap());
static SLASHES_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"/+").unwrap());
static WHITESPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());
static STAFF_TAIL_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[:\s/]+$").unwrap());

/// Scan state for one document. Never reused across documents.
#[derive(Debug, Default)]
pub struct SegmenterState {
    current_note: Option<NoteRecord>,
    in_notes_section: bool,
}

impl SegmenterState {
    /// Feed one paragraph. Finished notes are pushed onto `notes`.
    pub fn step(mut self, block: &ParagraphBlock, mut notes: Vec<NoteRecord>) -> (Self, Vec<NoteRecord>) {
        if !self.in_notes_section {
            // The marker paragraph itself is never note content.
            if block.full_text.contains(SECTION_MARKER) {
                self.in_notes_section = true;
            }
            return (self, notes);
        }

        let text = block.full_text.trim();
        if text.is_empty() {
            return (self, notes);
        }

        match parse_header(block) {
            Some(header) => {
                if let Some(done) = self.current_note.take() {
                    notes.push(finalize(done));
                }
                self.current_note = Some(header);
            }
            None => {
                // Text before the first dated header has no note to land in and is dropped.
                if let Some(note) = self.current_note.as_mut() {
                    note.body.push(' ');
                    note.body.push_str(text);
                }
            }
        }

        (self, notes)
    }

    /// Close the open note, if any, and return the complete list.
    pub fn finish(self, mut notes: Vec<NoteRecord>) -> Vec<NoteRecord> {
        if let Some(note) = self.current_note {
            notes.push(finalize(note));
        }
        notes
    }
}

/// Split a paragraph stream into dated case notes.
///
/// For a whole document pass `tables ++ body` (see `Document::note_stream`):
/// state carries over from the table paragraphs into the body paragraphs.
pub fn segment<'a, I>(blocks: I) -> Vec<NoteRecord>
where
    I: IntoIterator<Item = &'a ParagraphBlock>,
{
    let (state, notes) = blocks
        .into_iter()
        .fold((SegmenterState::default(), Vec::new()), |(state, notes), block| {
            state.step(block, notes)
        });
    state.finish(notes)
}

/// Leading bold runs concatenated, up to the first non-bold run.
fn bold_prefix(block: &ParagraphBlock) -> String {
    block
        .runs
        .iter()
        .take_while(|r| r.bold)
        .map(|r| r.text.as_str())
        .collect()
}

/// A header is a bold prefix that starts with a date, e.g. **1/5/2024 J.Smith:**.
fn parse_header(block: &ParagraphBlock) -> Option<NoteRecord> {
    let prefix = bold_prefix(block);
    let cleaned = prefix.trim();
    let m = DATE_RE.find(cleaned)?;
    if m.start() != 0 {
        return None;
    }

    let date = SLASHES_RE.replace_all(m.as_str(), "/").trim().to_string();
    let staff = STAFF_TAIL_RE
        .replace(cleaned[m.end()..].trim(), "")
        .into_owned();

    let body = match block.full_text.find(prefix.as_str()) {
        Some(start) => block.full_text[start + prefix.len()..].trim().to_string(),
        None => block.full_text.trim().to_string(),
    };

    Some(NoteRecord { date, staff, body })
}

fn finalize(mut note: NoteRecord) -> NoteRecord {
    note.body = WHITESPACE_RE.replace_all(&note.body, " ").trim().to_string();
    note
}
