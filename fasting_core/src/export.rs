//! Export of planned fasts to calendar (ICS) and CSV files.
//!
//! The export boundary refuses to produce an empty document: when no fast
//! qualifies it returns [`Error::NothingToExport`] so the caller can tell the
//! user instead of writing a file with no events.

use crate::calendar::{day_key, YearMonth};
use crate::{Error, FastRef, Plan, Result};
use chrono::NaiveDateTime;
use std::fs::OpenOptions;
use std::path::Path;

const UID_DOMAIN: &str = "fasting-planner";
const PRODID: &str = "-//FastingPlanner//EN";

/// One exportable calendar event
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExportRecord {
    /// Stable identifier derived from the start date
    pub uid: String,
    /// When the export was produced
    pub stamp: NaiveDateTime,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub summary: String,
    pub description: String,
}

impl From<(FastRef<'_>, NaiveDateTime)> for ExportRecord {
    fn from((r, stamp): (FastRef<'_>, NaiveDateTime)) -> Self {
        ExportRecord {
            uid: format!("{}@{}", r.fast.start_time().format("%Y%m%d"), UID_DOMAIN),
            stamp,
            start: r.fast.start_time(),
            end: r.fast.end_time(),
            summary: format!("Fast ({})", r.fast.fasting_length()),
            description: r.fast.goal().to_string(),
        }
    }
}

/// Build export records for a set of fasts
pub fn export_records<'a, I>(fasts: I, now: NaiveDateTime) -> Result<Vec<ExportRecord>>
where
    I: IntoIterator<Item = FastRef<'a>>,
{
    let records: Vec<ExportRecord> = fasts
        .into_iter()
        .map(|r| ExportRecord::from((r, now)))
        .collect();

    if records.is_empty() {
        return Err(Error::NothingToExport);
    }
    Ok(records)
}

/// Export records for every fast filed under a day of `month`
pub fn export_month(plan: &Plan, month: YearMonth, now: NaiveDateTime) -> Result<Vec<ExportRecord>> {
    export_records(plan.fasts_in_month(month), now)
}

fn ics_time(instant: NaiveDateTime) -> String {
    // Floating local time: the plan has no time zone attached
    instant.format("%Y%m%dT%H%M%S").to_string()
}

fn ics_escape(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace(';', "\\;")
        .replace(',', "\\,")
        .replace('\n', "\\n")
}

/// Render records as an iCalendar document with CRLF line endings
pub fn to_ics(records: &[ExportRecord]) -> String {
    let mut lines = vec![
        "BEGIN:VCALENDAR".to_string(),
        "VERSION:2.0".to_string(),
        format!("PRODID:{}", PRODID),
    ];
    for record in records {
        lines.push("BEGIN:VEVENT".into());
        lines.push(format!("UID:{}", record.uid));
        lines.push(format!("DTSTAMP:{}", ics_time(record.stamp)));
        lines.push(format!("DTSTART:{}", ics_time(record.start)));
        lines.push(format!("DTEND:{}", ics_time(record.end)));
        lines.push(format!("SUMMARY:{}", ics_escape(&record.summary)));
        lines.push(format!("DESCRIPTION:{}", ics_escape(&record.description)));
        lines.push("END:VEVENT".into());
    }
    lines.push("END:VCALENDAR".into());
    lines.join("\r\n")
}

/// Suggested file name for a month's calendar export
pub fn ics_file_name(month: YearMonth) -> String {
    format!("fasting-plan-{}.ics", month)
}

/// A row in the CSV history export
#[derive(Debug, serde::Serialize)]
struct CsvRow {
    day: String,
    protocol_hours: u32,
    start: String,
    end: String,
    completed: bool,
    difficulty: Option<u8>,
    feeling: Option<String>,
    note: Option<String>,
}

impl From<FastRef<'_>> for CsvRow {
    fn from(r: FastRef<'_>) -> Self {
        let completion = r.fast.completion();
        CsvRow {
            day: day_key(r.day),
            protocol_hours: r.fast.fasting_length().hours(),
            start: r.fast.start_time().format("%Y-%m-%dT%H:%M").to_string(),
            end: r.fast.end_time().format("%Y-%m-%dT%H:%M").to_string(),
            completed: completion.is_completed(),
            difficulty: completion.feeling().map(|f| f.difficulty),
            feeling: completion.feeling().map(|f| f.feeling.clone()),
            note: completion.note().map(str::to_string),
        }
    }
}

/// Write fasts to a CSV file (with headers), replacing any existing file
///
/// Returns the number of rows written.
pub fn write_history_csv<'a, I>(path: &Path, fasts: I) -> Result<usize>
where
    I: IntoIterator<Item = FastRef<'a>>,
{
    let rows: Vec<CsvRow> = fasts.into_iter().map(CsvRow::from).collect();
    if rows.is_empty() {
        return Err(Error::NothingToExport);
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(path)?;

    let mut writer = csv::WriterBuilder::new().has_headers(true).from_writer(file);
    for row in &rows {
        writer.serialize(row)?;
    }

    writer.flush()?;
    let file = writer
        .into_inner()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
    file.sync_all()?;

    tracing::info!("Wrote {} fasts to {:?}", rows.len(), path);
    Ok(rows.len())
}
