//! Builders for small in-memory `.docx` files used across the unit tests.

use std::io::{Cursor, Write};
use std::path::Path;

use quick_xml::escape::escape;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

/// `<w:p>` made of `(text, bold)` runs.
pub fn para(runs: &[(&str, bool)]) -> String {
    let runs: String = runs
        .iter()
        .map(|(text, bold)| {
            let props = if *bold { "<w:rPr><w:b/></w:rPr>" } else { "" };
            format!(r#"<w:r>{}<w:t xml:space="preserve">{}</w:t></w:r>"#, props, escape(*text))
        })
        .collect();
    format!("<w:p>{}</w:p>", runs)
}

/// `<w:tbl>` from rows of cells of paragraph xml.
pub fn table(rows: Vec<Vec<Vec<String>>>) -> String {
    let rows: String = rows
        .into_iter()
        .map(|cells| {
            let cells: String = cells
                .into_iter()
                .map(|paras| format!("<w:tc>{}</w:tc>", paras.concat()))
                .collect();
            format!("<w:tr>{}</w:tr>", cells)
        })
        .collect();
    format!("<w:tbl>{}</w:tbl>", rows)
}

pub fn document_xml(body: &str) -> String {
    format!(
        concat!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
            r#"<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main" "#,
            r#"xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">"#,
            "<w:body>{}</w:body></w:document>"
        ),
        body
    )
}

pub fn docx_bytes(document_xml: &str) -> Vec<u8> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    zip.start_file("[Content_Types].xml", SimpleFileOptions::default())
        .unwrap();
    zip.write_all(br#"<?xml version="1.0"?><Types/>"#).unwrap();
    zip.start_file("word/document.xml", SimpleFileOptions::default())
        .unwrap();
    zip.write_all(document_xml.as_bytes()).unwrap();
    zip.finish().unwrap().into_inner()
}

pub fn write_docx(path: &Path, document_xml: &str) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, docx_bytes(document_xml)).unwrap();
}

/// A typical case file: intake table with the notes section inside it, then more notes
/// in the body.
pub fn case_file_xml() -> String {
    let intake = table(vec![
        vec![
            vec![para(&[("Client", true)])],
            vec![para(&[("Jane Doe", false)])],
        ],
        vec![
            vec![para(&[("Entry Date", true)])],
            vec![para(&[("1/2/2024", false)])],
        ],
        vec![vec![
            para(&[("Case Notes:", true)]),
            para(&[("1/5/2024 J.Smith:", true), (" Visited client.", false)]),
            para(&[("Follow-up tomorrow.", false)]),
        ]],
    ]);
    let body = format!(
        "{}{}{}",
        intake,
        para(&[("1//6//2024 A. Lee:", true), (" Called, no answer.", false)]),
        para(&[("12/30/2023 A. Lee", true), (" Intake, scheduled visit.", false)]),
    );
    document_xml(&body)
}
