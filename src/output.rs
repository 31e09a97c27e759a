use std::io::{self, Write};

use camino::Utf8PathBuf;
use serde::Serialize;

use crate::app::{ProgressEvent, ProgressSink, RunSummary};
use crate::error::SaddError;
use crate::interval::AgeLabel;
use crate::normalize::OutputRow;

#[derive(Debug, Clone, Copy)]
pub enum OutputMode {
    Interactive,
    NonInteractive,
}

/// Consumer of the final reconciled table.
pub trait TableSink {
    fn write(&self, labels: &[AgeLabel], rows: &[OutputRow]) -> Result<(), SaddError>;
}

/// Writes the reconciled table as CSV: identity columns, Sex, then one
/// percentage column per requested label. Undefined percentages are written
/// as their IEEE spelling (`NaN`/`inf`) so downstream readers can tell
/// unknown from zero.
#[derive(Debug, Clone)]
pub struct CsvTableSink {
    path: Utf8PathBuf,
}

impl CsvTableSink {
    pub fn new(path: Utf8PathBuf) -> Self {
        Self { path }
    }
}

impl TableSink for CsvTableSink {
    fn write(&self, labels: &[AgeLabel], rows: &[OutputRow]) -> Result<(), SaddError> {
        let mut writer =
            csv::Writer::from_path(&self.path).map_err(|err| SaddError::Output(err.to_string()))?;

        let mut header = vec!["iso3", "idmc_short_name", "GRID_geographical_group", "Sex"];
        header.extend(labels.iter().map(AgeLabel::as_str));
        writer
            .write_record(&header)
            .map_err(|err| SaddError::Output(err.to_string()))?;

        for row in rows {
            let mut record = vec![
                row.iso3.clone(),
                row.short_name.clone(),
                row.region.clone(),
                row.sex.to_string(),
            ];
            record.extend(row.values.iter().map(|value| value.to_string()));
            writer
                .write_record(&record)
                .map_err(|err| SaddError::Output(err.to_string()))?;
        }

        writer
            .flush()
            .map_err(|err| SaddError::Output(err.to_string()))?;
        Ok(())
    }
}

pub struct JsonOutput;

impl JsonOutput {
    pub fn print_summary(summary: &RunSummary) -> io::Result<()> {
        Self::print_json(summary)
    }

    fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
        let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        let mut stdout = io::stdout();
        stdout.write_all(json.as_bytes())?;
        stdout.write_all(b"\n")?;
        Ok(())
    }
}

impl ProgressSink for JsonOutput {
    fn event(&self, _event: ProgressEvent) {}
}
