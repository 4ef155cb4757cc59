//! Picks the structured client case files out of a ZIP export of documents.

use std::fs::{self, File};
use std::io::{BufReader, Read};
use std::path::Path;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};
use zip::ZipArchive;

use crate::docx::{is_docx_path, Document};

/// Cap on the buffer reserved from an entry's declared size.
const MAX_RESERVE: u64 = 64 << 20;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FilterStats {
    pub found: usize,
    pub matched: usize,
}

/// Declared sizes come from the archive header and can lie.
fn reserve_for(declared: u64) -> usize {
    declared.min(MAX_RESERVE) as usize
}

/// A case file mentions one of the markers in a body paragraph or a table cell.
pub fn is_case_file(doc: &Document, markers: &[String]) -> bool {
    markers.iter().any(|m| doc.contains_text(m))
}

/// Copy every case-file `.docx` in `zip_path` into `out_dir`, keeping archive paths.
///
/// `out_dir` is recreated from scratch.
pub fn filter_archive(zip_path: &Path, out_dir: &Path, markers: &[String]) -> Result<FilterStats> {
    let file = File::open(zip_path).with_context(|| format!("Failed to open {:?}", zip_path))?;
    let mut archive = ZipArchive::new(BufReader::new(file))
        .with_context(|| format!("{:?} is not a readable zip archive", zip_path))?;

    if out_dir.exists() {
        warn!("Deleting existing output folder: {}", out_dir.display());
        fs::remove_dir_all(out_dir)
            .with_context(|| format!("Failed to clear {:?}", out_dir))?;
    }
    fs::create_dir_all(out_dir).with_context(|| format!("Failed to create {:?}", out_dir))?;

    let mut stats = FilterStats::default();

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        if entry.is_dir() {
            continue;
        }
        let Some(relative) = entry.enclosed_name() else {
            warn!("Skipping unsafe entry name: {}", entry.name());
            continue;
        };
        if !is_docx_path(&relative) {
            continue;
        }
        stats.found += 1;

        let mut bytes = Vec::with_capacity(reserve_for(entry.size()));
        entry
            .read_to_end(&mut bytes)
            .with_context(|| format!("Failed to read {:?} from archive", relative))?;

        let matched = match Document::from_bytes(&bytes) {
            Ok(doc) => is_case_file(&doc, markers),
            Err(e) => {
                debug!("{}: unreadable docx: {}", relative.display(), e);
                false
            }
        };

        if matched {
            let dest = out_dir.join(&relative);
            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&dest, &bytes).with_context(|| format!("Failed to write {:?}", dest))?;
            stats.matched += 1;
            info!("[MATCHED] {}", relative.display());
        } else {
            info!("[Skipped] {}: no case-file marker", relative.display());
        }
    }

    Ok(stats)
}
