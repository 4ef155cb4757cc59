//! Renders a parsed report into an `.xlsx` workbook.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use chrono::{Datelike, NaiveDate};
use regex::Regex;
use rust_xlsxwriter::{ExcelDateTime, Format, Workbook, XlsxError};

use crate::notes::NoteRecord;
use crate::report::{Report, NOTES_HEADER};

pub const PROFILE_SHEET: &str = "Profile";
pub const NOTES_SHEET: &str = "Case Notes";

/// Years a spreadsheet date cell can hold.
const EXCEL_YEARS: std::ops::RangeInclusive<i32> = 1900..=9999;

static EXTRACTED_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)_extracted").unwrap());

#[derive(Debug, PartialEq, Eq)]
pub enum Rendered {
    Written { rows: usize },
    /// Every note date failed to parse; nothing was written.
    NoDatedNotes,
}

/// Month/day/year with `/` separators. Two-digit years follow `%y` (69-99 -> 19xx).
/// Years outside 1900..=9999 count as unparseable.
pub fn parse_note_date(raw: &str) -> Option<NaiveDate> {
    let parts: Vec<&str> = raw.trim().split('/').collect();
    let [month, day, year] = parts.as_slice() else {
        return None;
    };
    if [month, day, year]
        .iter()
        .any(|p| p.is_empty() || !p.bytes().all(|b| b.is_ascii_digit()))
    {
        return None;
    }

    let month: u32 = month.parse().ok()?;
    let day: u32 = day.parse().ok()?;
    let year: i32 = match year.len() {
        2 => {
            let y: i32 = year.parse().ok()?;
            if y < 69 {
                2000 + y
            } else {
                1900 + y
            }
        }
        4 => year.parse().ok()?,
        _ => return None,
    };
    if !EXCEL_YEARS.contains(&year) {
        return None;
    }
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Notes with a real date, newest first. Notes sharing a date keep their order.
pub fn dated_notes(notes: &[NoteRecord]) -> Vec<(NaiveDate, &NoteRecord)> {
    let mut dated: Vec<_> = notes
        .iter()
        .filter_map(|n| parse_note_date(&n.date).map(|d| (d, n)))
        .collect();
    dated.sort_by(|a, b| b.0.cmp(&a.0));
    dated
}

/// `<stem minus "_extracted">.xlsx` next to the csv.
pub fn workbook_path(csv_path: &Path) -> PathBuf {
    let stem = csv_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let cleaned = EXTRACTED_RE.replace_all(&stem, "");
    csv_path.with_file_name(format!("{}.xlsx", cleaned))
}

pub fn render_workbook(report: &Report, path: &Path) -> Result<Rendered, XlsxError> {
    let dated = dated_notes(&report.notes);
    if dated.is_empty() {
        return Ok(Rendered::NoDatedNotes);
    }

    let mut workbook = Workbook::new();

    let profile = workbook.add_worksheet().set_name(PROFILE_SHEET)?;
    profile.write_string(0, 0, "Client")?;
    profile.write_string(0, 1, report.profile.name.as_str())?;
    profile.write_string(2, 0, "HMIS #")?;
    profile.write_string(2, 1, report.profile.hmis.as_str())?;

    let date_format = Format::new().set_num_format("yyyy-mm-dd");
    let sheet = workbook.add_worksheet().set_name(NOTES_SHEET)?;
    for (col, title) in NOTES_HEADER.iter().enumerate() {
        sheet.write_string(0, col as u16, *title)?;
    }
    for (i, (date, note)) in dated.iter().enumerate() {
        let row = (i + 1) as u32;
        let cell_date = ExcelDateTime::from_ymd(date.year() as u16, date.month() as u8, date.day() as u8)?;
        sheet.write_datetime_with_format(row, 0, &cell_date, &date_format)?;
        sheet.write_string(row, 1, note.staff.as_str())?;
        sheet.write_string(row, 2, note.body.as_str())?;
    }

    workbook.save(path)?;
    Ok(Rendered::Written { rows: dated.len() })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::ClientProfile;

    fn note(date: &str, body: &str) -> NoteRecord {
        NoteRecord {
            date: date.into(),
            staff: "S".into(),
            body: body.into(),
        }
    }

    #[test]
    fn date_parsing() {
        assert_eq!(parse_note_date("1/5/2024"), NaiveDate::from_ymd_opt(2024, 1, 5));
        assert_eq!(parse_note_date(" 12/31/23 "), NaiveDate::from_ymd_opt(2023, 12, 31));
        assert_eq!(parse_note_date("3/4/99"), NaiveDate::from_ymd_opt(1999, 3, 4));
        assert_eq!(parse_note_date("13/1/2024"), None);
        assert_eq!(parse_note_date("2/30/2024"), None);
        assert_eq!(parse_note_date("1/5/202"), None);
        assert_eq!(parse_note_date("1-5-2024"), None);
        assert_eq!(parse_note_date(""), None);
        assert_eq!(parse_note_date("1/7/1024"), None);
        assert_eq!(parse_note_date("1/7/1900"), NaiveDate::from_ymd_opt(1900, 1, 7));
    }

    #[test]
    fn newest_first_and_undatable_dropped() {
        let notes = vec![
            note("1/5/2024", "a"),
            note("13/40/2024", "bad"),
            note("3/1/2024", "b"),
            note("1/5/2024", "c"),
            note("12/1/23", "d"),
        ];
        let bodies: Vec<&str> = dated_notes(&notes).iter().map(|(_, n)| n.body.as_str()).collect();
        assert_eq!(bodies, vec!["b", "a", "c", "d"]);
    }

    #[test]
    fn output_name() {
        assert_eq!(
            workbook_path(Path::new("x/Jane #1_CASENOTES_extracted.csv")),
            Path::new("x/Jane #1_CASENOTES.xlsx")
        );
        assert_eq!(workbook_path(Path::new("a_EXTRACTED.csv")), Path::new("a.xlsx"));
        assert_eq!(workbook_path(Path::new("plain.csv")), Path::new("plain.xlsx"));
    }

    #[test]
    fn writes_workbook() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.xlsx");
        let report = Report {
            profile: ClientProfile {
                name: "Jane".into(),
                hmis: "1".into(),
            },
            notes: vec![note("1/5/2024", "a"), note("nope", "b")],
        };
        assert_eq!(render_workbook(&report, &path).unwrap(), Rendered::Written { rows: 1 });
        assert!(std::fs::metadata(&path).unwrap().len() > 0);
    }

    #[test]
    fn typo_year_does_not_sink_the_workbook() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.xlsx");
        let report = Report {
            profile: ClientProfile {
                name: "Jane".into(),
                hmis: "1".into(),
            },
            notes: vec![note("1/5/2024", "a"), note("1/6/2024", "b"), note("1/7/1024", "c")],
        };
        assert_eq!(render_workbook(&report, &path).unwrap(), Rendered::Written { rows: 2 });
        assert!(path.exists());
    }

    #[test]
    fn nothing_dated_nothing_written() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.xlsx");
        let report = Report {
            profile: ClientProfile {
                name: "Jane".into(),
                hmis: "1".into(),
            },
            notes: vec![note("someday", "a")],
        };
        assert_eq!(render_workbook(&report, &path).unwrap(), Rendered::NoDatedNotes);
        assert!(!path.exists());
    }
}
