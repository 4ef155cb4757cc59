use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use super::{Document, DocxError, Table, TableCell};
use crate::notes::{ParagraphBlock, Run};

#[derive(Clone, Copy)]
enum Target {
    Body,
    Cell,
}

struct OpenParagraph {
    depth: usize,
    target: Target,
    block: ParagraphBlock,
}

struct OpenRun {
    depth: usize,
    /// Direct child of the paragraph. Runs inside `w:hyperlink` only add text.
    direct: bool,
    run: Run,
}

/// Walks WordprocessingML, tracking the open element path so that each
/// `w:p`/`w:r`/`w:t` is only taken at the nesting level where it counts.
#[derive(Default)]
struct Walker {
    stack: Vec<Vec<u8>>,
    top_table: Option<usize>,
    paragraph: Option<OpenParagraph>,
    run: Option<OpenRun>,
    doc: Document,
}

/// Parse `word/document.xml` into body paragraphs and top-level tables.
pub fn parse_document_xml(xml: &str) -> Result<Document, DocxError> {
    let mut reader = Reader::from_str(xml);
    let mut walker = Walker::default();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => walker.open(&e),
            Ok(Event::Empty(e)) => {
                walker.open(&e);
                walker.close();
            }
            Ok(Event::End(_)) => walker.close(),
            Ok(Event::Text(e)) if walker.in_text() => {
                let text = e.unescape().map_err(|e| DocxError::Xml(e.to_string()))?;
                walker.push_text(&text);
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(DocxError::Xml(format!(
                    "error at position {}: {}",
                    reader.buffer_position(),
                    e
                )))
            }
            _ => {}
        }
        buf.clear();
    }

    Ok(walker.doc)
}

impl Walker {
    fn parent_is(&self, name: &[u8]) -> bool {
        self.stack.last().is_some_and(|n| n.as_slice() == name)
    }

    fn open(&mut self, e: &BytesStart) {
        let name = e.name().as_ref().to_vec();
        let depth = self.stack.len();

        match name.as_slice() {
            b"w:tbl" if self.top_table.is_none() && self.parent_is(b"w:body") => {
                self.top_table = Some(depth);
                self.doc.tables.push(Table::default());
            }
            b"w:tr" if self.top_table.is_some_and(|t| depth == t + 1) => {
                if let Some(table) = self.doc.tables.last_mut() {
                    table.rows.push(Vec::new());
                }
            }
            b"w:tc" if self.top_table.is_some_and(|t| depth == t + 2) => {
                if let Some(row) = self.doc.tables.last_mut().and_then(|t| t.rows.last_mut()) {
                    row.push(TableCell::default());
                }
            }
            b"w:p" if self.paragraph.is_none() => {
                let target = if self.parent_is(b"w:body") {
                    Some(Target::Body)
                } else if self.top_table.is_some_and(|t| depth == t + 3) && self.parent_is(b"w:tc") {
                    Some(Target::Cell)
                } else {
                    None
                };
                if let Some(target) = target {
                    self.paragraph = Some(OpenParagraph {
                        depth,
                        target,
                        block: ParagraphBlock::default(),
                    });
                }
            }
            b"w:r" if self.run.is_none() => {
                if let Some(p) = &self.paragraph {
                    let direct = depth == p.depth + 1;
                    let in_link = depth == p.depth + 2 && self.parent_is(b"w:hyperlink");
                    if direct || in_link {
                        self.run = Some(OpenRun {
                            depth,
                            direct,
                            run: Run::default(),
                        });
                    }
                }
            }
            b"w:b" => {
                if let Some(r) = self.run.as_mut() {
                    let in_props = depth == r.depth + 2
                        && self.stack.last().is_some_and(|n| n.as_slice() == b"w:rPr");
                    if in_props {
                        r.run.bold = toggle_value(e);
                    }
                }
            }
            b"w:tab" | b"w:ptab" | b"w:br" | b"w:cr" | b"w:noBreakHyphen" => {
                if let Some(r) = self.run.as_mut() {
                    if depth == r.depth + 1 {
                        r.run.text.push_str(inline_text(&name, e));
                    }
                }
            }
            _ => {}
        }

        self.stack.push(name);
    }

    fn close(&mut self) {
        let Some(name) = self.stack.pop() else {
            return;
        };
        let depth = self.stack.len();

        match name.as_slice() {
            b"w:r" if self.run.as_ref().is_some_and(|r| r.depth == depth) => {
                if let (Some(open), Some(p)) = (self.run.take(), self.paragraph.as_mut()) {
                    p.block.full_text.push_str(&open.run.text);
                    if open.direct {
                        p.block.runs.push(open.run);
                    }
                }
            }
            b"w:p" if self.paragraph.as_ref().is_some_and(|p| p.depth == depth) => {
                if let Some(open) = self.paragraph.take() {
                    self.finish_paragraph(open);
                }
            }
            b"w:tbl" if self.top_table == Some(depth) => {
                self.top_table = None;
            }
            _ => {}
        }
    }

    fn finish_paragraph(&mut self, open: OpenParagraph) {
        match open.target {
            Target::Body => self.doc.paragraphs.push(open.block),
            Target::Cell => {
                let cell = self
                    .doc
                    .tables
                    .last_mut()
                    .and_then(|t| t.rows.last_mut())
                    .and_then(|row| row.last_mut());
                if let Some(cell) = cell {
                    cell.paragraphs.push(open.block);
                }
            }
        }
    }

    /// Inside a `w:t` that belongs to the open run.
    fn in_text(&self) -> bool {
        match &self.run {
            Some(r) => self.stack.len() == r.depth + 2 && self.parent_is(b"w:t"),
            None => false,
        }
    }

    fn push_text(&mut self, text: &str) {
        if let Some(r) = self.run.as_mut() {
            r.run.text.push_str(text);
        }
    }
}

/// Text that a run-level marker element stands for. Page and column breaks add nothing.
fn inline_text(name: &[u8], e: &BytesStart) -> &'static str {
    match name {
        b"w:tab" | b"w:ptab" => "\t",
        b"w:noBreakHyphen" => "-",
        b"w:br" => match attr(e, b"w:type").as_deref() {
            Some(b"page") | Some(b"column") => "",
            _ => "\n",
        },
        _ => "\n",
    }
}

fn attr(e: &BytesStart, key: &[u8]) -> Option<Vec<u8>> {
    e.attributes()
        .flatten()
        .find(|a| a.key.as_ref() == key)
        .map(|a| a.value.into_owned())
}

/// OOXML on/off property: present without `w:val` means on.
fn toggle_value(e: &BytesStart) -> bool {
    attr(e, b"w:val")
        .map(|v| !matches!(v.as_slice(), b"0" | b"false" | b"off"))
        .unwrap_or(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{document_xml, para, table};

    #[test]
    fn bold_flags() {
        let body = r#"<w:p>
            <w:r><w:rPr><w:b/></w:rPr><w:t>a</w:t></w:r>
            <w:r><w:rPr><w:b w:val="0"/></w:rPr><w:t>b</w:t></w:r>
            <w:r><w:rPr><w:b w:val="true"/></w:rPr><w:t>c</w:t></w:r>
            <w:r><w:rPr><w:b w:val="false"/></w:rPr><w:t>d</w:t></w:r>
            <w:r><w:t>e</w:t></w:r>
        </w:p>"#;
        let doc = parse_document_xml(&document_xml(body)).unwrap();
        let bold: Vec<bool> = doc.paragraphs[0].runs.iter().map(|r| r.bold).collect();
        assert_eq!(bold, vec![true, false, true, false, false]);
        assert_eq!(doc.paragraphs[0].full_text, "abcde");
    }

    #[test]
    fn paragraph_mark_bold_is_not_run_bold() {
        let body = r#"<w:p><w:pPr><w:rPr><w:b/></w:rPr></w:pPr><w:r><w:t>x</w:t></w:r></w:p>"#;
        let doc = parse_document_xml(&document_xml(body)).unwrap();
        assert!(!doc.paragraphs[0].runs[0].bold);
    }

    #[test]
    fn hyperlink_text_without_run() {
        let body = r#"<w:p>
            <w:r><w:t xml:space="preserve">see </w:t></w:r>
            <w:hyperlink r:id="rId5"><w:r><w:t>portal</w:t></w:r></w:hyperlink>
            <w:r><w:t xml:space="preserve"> now</w:t></w:r>
        </w:p>"#;
        let doc = parse_document_xml(&document_xml(body)).unwrap();
        let p = &doc.paragraphs[0];
        assert_eq!(p.full_text, "see portal now");
        assert_eq!(p.runs.len(), 2);
    }

    #[test]
    fn tabs_breaks_and_entities() {
        let body = r#"<w:p><w:r><w:t>A&amp;B</w:t><w:tab/><w:t>C</w:t><w:br/><w:t>&lt;D&gt;</w:t></w:r></w:p>"#;
        let doc = parse_document_xml(&document_xml(body)).unwrap();
        assert_eq!(doc.paragraphs[0].full_text, "A&B\tC\n<D>");
    }

    #[test]
    fn hyphens_positional_tabs_and_page_breaks() {
        let body = r#"<w:p><w:r><w:t>Smith</w:t><w:noBreakHyphen/><w:t>Jones</w:t><w:ptab w:relativeTo="margin" w:alignment="right" w:leader="none"/><w:t>x</w:t><w:br w:type="page"/><w:t>y</w:t><w:br w:type="column"/><w:t>z</w:t><w:br w:type="textWrapping"/><w:t>w</w:t></w:r></w:p>"#;
        let doc = parse_document_xml(&document_xml(body)).unwrap();
        assert_eq!(doc.paragraphs[0].full_text, "Smith-Jones\txyz\nw");
    }

    #[test]
    fn tab_stops_are_not_text() {
        let body = r#"<w:p><w:pPr><w:tabs><w:tab w:val="left" w:pos="720"/></w:tabs></w:pPr><w:r><w:t>x</w:t></w:r></w:p>"#;
        let doc = parse_document_xml(&document_xml(body)).unwrap();
        assert_eq!(doc.paragraphs[0].full_text, "x");
    }

    #[test]
    fn nested_tables_and_text_boxes_skipped() {
        let inner = table(vec![vec![vec![para(&[("inner", false)])]]]);
        let body = format!(
            r#"<w:tbl><w:tr><w:tc>{}{}{}</w:tc><w:tc>{}</w:tc></w:tr></w:tbl>
            <w:p><w:r><w:t>body</w:t></w:r><w:r><w:txbxContent><w:p><w:r><w:t>boxed</w:t></w:r></w:p></w:txbxContent></w:r></w:p>"#,
            para(&[("before", false)]),
            inner,
            para(&[("after", false)]),
            para(&[("second cell", false)]),
        );
        let doc = parse_document_xml(&document_xml(&body)).unwrap();
        assert_eq!(doc.tables.len(), 1);
        let cells = &doc.tables[0].rows[0];
        assert_eq!(cells.len(), 2);
        let first: Vec<&str> = cells[0].paragraphs.iter().map(|p| p.full_text.as_str()).collect();
        assert_eq!(first, vec!["before", "after"]);
        assert_eq!(cells[1].paragraphs[0].full_text, "second cell");
        assert_eq!(doc.paragraphs.len(), 1);
        assert_eq!(doc.paragraphs[0].full_text, "body");
    }

    #[test]
    fn empty_paragraph_element() {
        let doc = parse_document_xml(&document_xml("<w:p/><w:p></w:p>")).unwrap();
        assert_eq!(doc.paragraphs.len(), 2);
        assert!(doc.paragraphs.iter().all(|p| p.full_text.is_empty()));
    }

    #[test]
    fn malformed_xml_is_an_error() {
        let err = parse_document_xml("<w:document><w:body><w:p></w:body>").unwrap_err();
        assert!(matches!(err, DocxError::Xml(_)));
    }
}
