//! Writers for forecasts, scores and failure reports

use crate::aggregate::ForecastRecord;
use crate::error::{CityFailure, Result};
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Per-city failure as written to reports
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailureRecord {
    pub city: String,
    pub reason: String,
    pub detail: String,
}

impl From<&CityFailure> for FailureRecord {
    fn from(failure: &CityFailure) -> Self {
        Self {
            city: failure.city.clone(),
            reason: failure.reason().to_string(),
            detail: failure.error.to_string(),
        }
    }
}

/// Write forecast records as CSV with a header row
pub fn write_forecast_csv<W: Write>(writer: W, records: &[ForecastRecord]) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for record in records {
        csv_writer.serialize(record)?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Write any serializable rows as JSON lines, one object per line
pub fn write_json_lines<W: Write, T: Serialize>(writer: W, rows: &[T]) -> Result<()> {
    let mut writer = BufWriter::new(writer);
    for row in rows {
        serde_json::to_writer(&mut writer, row)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(())
}

/// Write a value as pretty-printed JSON
pub fn write_json_pretty<W: Write, T: Serialize + ?Sized>(writer: W, value: &T) -> Result<()> {
    let mut writer = BufWriter::new(writer);
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

/// Create `path` and write forecast records as CSV
pub fn save_forecast_csv<P: AsRef<Path>>(path: P, records: &[ForecastRecord]) -> Result<()> {
    write_forecast_csv(File::create(path)?, records)
}

/// Create `path` and write rows as JSON lines
pub fn save_json_lines<P: AsRef<Path>, T: Serialize>(path: P, rows: &[T]) -> Result<()> {
    write_json_lines(File::create(path)?, rows)
}

/// Create `path` and write a value as pretty JSON
pub fn save_json_pretty<P: AsRef<Path>, T: Serialize + ?Sized>(path: P, value: &T) -> Result<()> {
    write_json_pretty(File::create(path)?, value)
}

/// Failure records in input order
pub fn failure_records(failures: &[CityFailure]) -> Vec<FailureRecord> {
    failures.iter().map(FailureRecord::from).collect()
}
