use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::docx::{is_docx_path, Document};
use crate::identity::ClientIdentity;
use crate::notes::{segment, NoteRecord, SECTION_MARKER};
use crate::report::{self, ReportError};
use crate::settings::Settings;
use crate::sheet::{self, Rendered};

#[derive(Debug, Default, PartialEq, Eq)]
pub struct ExtractCounts {
    pub documents: usize,
    pub notes: usize,
    /// Reports written with no notes in them.
    pub empty: usize,
    pub failed: usize,
}

impl ExtractCounts {
    pub fn print(&self) {
        println!(
            "Extracted {} notes from {} documents ({} without notes, {} failed).",
            self.notes, self.documents, self.empty, self.failed,
        );
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct RenderCounts {
    pub reports: usize,
    pub workbooks: usize,
    pub rows: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl RenderCounts {
    pub fn print(&self) {
        println!(
            "Rendered {} workbooks ({} rows) from {} csv files ({} skipped, {} failed).",
            self.workbooks, self.rows, self.reports, self.skipped, self.failed,
        );
    }
}

/// Files under `dir` accepted by `keep`, sorted for stable output.
pub fn find_files(dir: &Path, keep: impl Fn(&Path) -> bool) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| match e {
            Ok(e) => Some(e),
            Err(err) => {
                warn!("Skipping unreadable path: {}", err);
                None
            }
        })
        .filter(|e| e.file_type().is_file() && keep(e.path()))
        .map(|e| e.into_path())
        .collect();
    files.sort();
    files
}

fn is_csv_path(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("csv"))
}

/// Segment one document into notes.
pub fn document_notes(path: &Path) -> Result<Vec<NoteRecord>> {
    let doc = Document::open(path).with_context(|| format!("Failed to open {:?}", path))?;
    let notes = segment(doc.note_stream());
    if notes.is_empty() {
        let reason = if doc.contains_text(SECTION_MARKER) {
            "no dated entry after the notes marker"
        } else {
            "no notes marker"
        };
        warn!("{}: no case notes extracted ({})", path.display(), reason);
    }
    Ok(notes)
}

/// Extract one document and write its report. Returns the note count.
pub fn extract_document(path: &Path, settings: &Settings) -> Result<usize> {
    let notes = document_notes(path)?;
    let client = ClientIdentity::from_path(path);
    let out = report::report_path(path, &settings.extracted_suffix);
    report::write_report_file(&out, &client, &notes)
        .with_context(|| format!("Failed to write {:?}", out))?;
    info!("{} -> {} ({} notes)", path.display(), out.display(), notes.len());
    Ok(notes.len())
}

pub fn extract_dir(dir: &Path, settings: &Settings) -> Result<ExtractCounts> {
    let files = find_files(dir, is_docx_path);
    let mut counts = ExtractCounts::default();
    if files.is_empty() {
        return Ok(counts);
    }

    let pb = progress_bar(files.len())?;
    for chunk in files.chunks(settings.chunk_size) {
        let results: Vec<_> = chunk
            .par_iter()
            .map(|path| (path, extract_document(path, settings)))
            .collect();

        for (path, result) in results {
            counts.documents += 1;
            match result {
                Ok(0) => counts.empty += 1,
                Ok(n) => counts.notes += n,
                Err(e) => {
                    counts.failed += 1;
                    warn!("{}: {:#}", path.display(), e);
                }
            }
        }
        pb.inc(chunk.len() as u64);
    }
    pb.finish_and_clear();

    Ok(counts)
}

/// Render one csv report. `Ok(None)` means it was skipped.
pub fn render_file(csv_path: &Path) -> Result<Option<usize>> {
    let report = match report::read_report_file(csv_path) {
        Ok(r) => r,
        Err(ReportError::MissingNotesHeader) => {
            info!("Skipping {}: no case notes header", csv_path.display());
            return Ok(None);
        }
        Err(e) => return Err(e).with_context(|| format!("Failed to read {:?}", csv_path)),
    };

    let out = sheet::workbook_path(csv_path);
    match sheet::render_workbook(&report, &out).with_context(|| format!("Failed to write {:?}", out))? {
        Rendered::Written { rows } => {
            info!("{} -> {} ({} rows)", csv_path.display(), out.display(), rows);
            Ok(Some(rows))
        }
        Rendered::NoDatedNotes => {
            info!("Skipping {}: no datable notes", csv_path.display());
            Ok(None)
        }
    }
}

pub fn render_dir(dir: &Path, settings: &Settings) -> Result<RenderCounts> {
    let files = find_files(dir, is_csv_path);
    let mut counts = RenderCounts::default();
    if files.is_empty() {
        return Ok(counts);
    }

    let pb = progress_bar(files.len())?;
    for chunk in files.chunks(settings.chunk_size) {
        let results: Vec<_> = chunk.par_iter().map(|path| (path, render_file(path))).collect();

        for (path, result) in results {
            counts.reports += 1;
            match result {
                Ok(Some(rows)) => {
                    counts.workbooks += 1;
                    counts.rows += rows;
                }
                Ok(None) => counts.skipped += 1,
                Err(e) => {
                    counts.failed += 1;
                    warn!("{}: {:#}", path.display(), e);
                }
            }
        }
        pb.inc(chunk.len() as u64);
    }
    pb.finish_and_clear();

    Ok(counts)
}

fn progress_bar(len: usize) -> Result<ProgressBar> {
    let pb = ProgressBar::new(len as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec})")?
            .progress_chars("#>-"),
    );
    Ok(pb)
}
