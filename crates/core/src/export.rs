use chrono::{Local, NaiveDate, TimeZone};

use crate::{
    error::{Result, TrackerError},
    types::EventRecord,
};

pub const CSV_HEADER: [&str; 6] = ["Data/Hora", "Categoria", "Ação", "Label", "Valor", "Página"];

/// Format epoch milliseconds the way pt-BR locales print date and time.
pub fn format_timestamp<Tz: TimeZone>(timestamp_ms: i64, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    match tz.timestamp_millis_opt(timestamp_ms).single() {
        Some(dt) => dt.format("%d/%m/%Y, %H:%M:%S").to_string(),
        None => timestamp_ms.to_string(),
    }
}

/// Serialize the snapshot as CSV in the local time zone.
///
/// An empty snapshot yields an empty string, not a header-only file.
pub fn export_csv(snapshot: &[EventRecord]) -> Result<String> {
    export_csv_in(snapshot, &Local)
}

pub fn export_csv_in<Tz: TimeZone>(snapshot: &[EventRecord], tz: &Tz) -> Result<String>
where
    Tz::Offset: std::fmt::Display,
{
    if snapshot.is_empty() {
        return Ok(String::new());
    }

    let mut wtr = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    wtr.write_record(CSV_HEADER)?;
    for event in snapshot {
        let value = event.value.map(|v| v.to_string()).unwrap_or_default();
        wtr.write_record([
            format_timestamp(event.timestamp, tz).as_str(),
            event.category.as_str(),
            event.action.as_str(),
            event.label.as_deref().unwrap_or(""),
            value.as_str(),
            event.page.as_str(),
        ])?;
    }

    let bytes = wtr
        .into_inner()
        .map_err(|e| TrackerError::IoError(e.into_error()))?;
    let mut csv = String::from_utf8_lossy(&bytes).into_owned();
    if csv.ends_with('\n') {
        csv.pop();
    }
    Ok(csv)
}

/// Default download name, e.g. `softham-analytics-2026-10-19.csv`.
pub fn export_file_name(date: NaiveDate) -> String {
    format!("softham-analytics-{}.csv", date.format("%Y-%m-%d"))
}
