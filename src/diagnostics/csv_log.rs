//! CSV export of speed reports

use super::SpeedRecord;
use crate::{ProfilerError, Result};
use std::io;

/// Appends [`SpeedRecord`]s as CSV rows, header first
pub struct CsvSpeedLog<W: io::Write> {
    writer: csv::Writer<W>,
}

impl<W: io::Write> CsvSpeedLog<W> {
    /// Log into `out`
    pub fn new(out: W) -> Self {
        CsvSpeedLog {
            writer: csv::Writer::from_writer(out),
        }
    }

    /// Write one record
    pub fn append(&mut self, record: &SpeedRecord) -> Result<()> {
        self.writer
            .serialize(record)
            .map_err(|e| ProfilerError::Other(format!("can't write speed record: {e}")))
    }

    /// Flush buffered rows
    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }

    /// Flush and return the underlying writer
    pub fn into_inner(self) -> Result<W> {
        self.writer
            .into_inner()
            .map_err(|e| ProfilerError::Other(format!("can't flush speed log: {e}")))
    }
}
