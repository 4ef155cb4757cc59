//! Per-client CSV report: a small profile header followed by the notes table.

use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

use crate::identity::{ClientIdentity, UNKNOWN_ID};
use crate::notes::NoteRecord;

pub const NOTES_HEADER: [&str; 3] = ["Date", "Staff", "Note"];
pub const UNKNOWN_CLIENT: &str = "UNKNOWN CLIENT";

/// Blank rows between the profile and the notes table.
const SPACER_ROWS: usize = 4;

static CLIENT_CUT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s\d+| Case Notes").unwrap());

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("no Date,Staff,Note header row")]
    MissingNotesHeader,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientProfile {
    pub name: String,
    pub hmis: String,
}

#[derive(Debug, Clone)]
pub struct Report {
    pub profile: ClientProfile,
    pub notes: Vec<NoteRecord>,
}

/// `<dir>/<stem><suffix>.csv` next to the source document.
pub fn report_path(docx: &Path, suffix: &str) -> PathBuf {
    let stem = docx
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    docx.with_file_name(format!("{}{}.csv", stem, suffix))
}

pub fn write_report<W: Write>(
    writer: W,
    client: &ClientIdentity,
    notes: &[NoteRecord],
) -> Result<(), ReportError> {
    let mut wtr = csv::WriterBuilder::new()
        .flexible(true)
        .terminator(csv::Terminator::CRLF)
        .from_writer(writer);

    wtr.write_record(["Client", client.name.as_str()])?;
    wtr.write_record(["HMIS #", client.id.as_str()])?;
    for _ in 0..SPACER_ROWS {
        wtr.write_record(["", ""])?;
    }
    wtr.write_record(["Case Notes", ""])?;
    wtr.write_record(NOTES_HEADER)?;
    for note in notes {
        wtr.write_record([note.date.as_str(), note.staff.as_str(), note.body.as_str()])?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_report_file(
    path: &Path,
    client: &ClientIdentity,
    notes: &[NoteRecord],
) -> Result<(), ReportError> {
    write_report(File::create(path)?, client, notes)
}

pub fn read_report<R: Read>(reader: R) -> Result<Report, ReportError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);
    let records = rdr.records().collect::<Result<Vec<_>, _>>()?;

    let profile = parse_profile(&records);

    let header_idx = records
        .iter()
        .position(|r| r.iter().take(3).eq(NOTES_HEADER))
        .ok_or(ReportError::MissingNotesHeader)?;

    let notes = records[header_idx + 1..]
        .iter()
        .filter(|r| r.iter().any(|f| !f.trim().is_empty()))
        .map(|r| NoteRecord {
            date: r.get(0).unwrap_or_default().to_string(),
            staff: r.get(1).unwrap_or_default().to_string(),
            body: r.get(2).unwrap_or_default().to_string(),
        })
        .collect();

    Ok(Report { profile, notes })
}

pub fn read_report_file(path: &Path) -> Result<Report, ReportError> {
    read_report(File::open(path)?)
}

/// First two meaningful rows carry the client string and the HMIS number.
fn parse_profile(records: &[csv::StringRecord]) -> ClientProfile {
    let mut data_rows = records.iter().filter(|r| {
        r.iter().any(|f| !f.trim().is_empty()) && !r.get(0).unwrap_or_default().trim().starts_with('#')
    });
    let (Some(first), Some(second)) = (data_rows.next(), data_rows.next()) else {
        return ClientProfile {
            name: UNKNOWN_CLIENT.to_string(),
            hmis: UNKNOWN_ID.to_string(),
        };
    };

    let name = match first.get(1) {
        Some(raw) => {
            let client = raw.trim().trim_matches('"');
            match CLIENT_CUT_RE.find(client) {
                Some(m) => client[..m.start()].trim().to_string(),
                None => client.trim().to_string(),
            }
        }
        None => UNKNOWN_CLIENT.to_string(),
    };
    let hmis = second
        .get(1)
        .map(|raw| raw.trim().trim_matches('"').to_string())
        .unwrap_or_else(|| UNKNOWN_ID.to_string());

    ClientProfile { name, hmis }
}
