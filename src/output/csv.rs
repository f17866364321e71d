//! CSV output writer implementation

use csv::{Terminator, Writer, WriterBuilder};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use tracing::{debug, info};

use super::{OutputError, OutputResult, OutputWriter, RowsWriter};
use crate::normalize::NormalizedRow;

const DEFAULT_BUFFER_SIZE: usize = 8192; // 8KB buffer

/// Streaming CSV writer for normalized rows
///
/// The header is taken from the first row written; every later row must
/// have the same columns in the same order.
pub struct CsvRowsWriter {
    writer: Writer<BufWriter<File>>,
    headers: Option<Vec<&'static str>>,
    rows_written: u64,
}

impl CsvRowsWriter {
    /// Create a new CSV rows writer
    ///
    /// The parent directory must already exist.
    ///
    /// # Errors
    /// Returns `OutputError::Io` if the file cannot be created.
    pub fn new<P: AsRef<Path>>(path: P) -> OutputResult<Self> {
        Self::new_with_buffer_size(path, DEFAULT_BUFFER_SIZE)
    }

    /// Create a new CSV rows writer with custom buffer size
    pub fn new_with_buffer_size<P: AsRef<Path>>(
        path: P,
        buffer_size: usize,
    ) -> OutputResult<Self> {
        let path = path.as_ref();
        info!("Creating CSV writer: path={}", path.display());

        let file = File::create(path).map_err(|e| {
            OutputError::Io(format!("Failed to create file {}: {}", path.display(), e))
        })?;

        let buf_writer = BufWriter::with_capacity(buffer_size, file);
        let csv_writer = WriterBuilder::new()
            .terminator(Terminator::CRLF)
            .from_writer(buf_writer);

        debug!("CSV writer created (header written with first row)");

        Ok(Self {
            writer: csv_writer,
            headers: None,
            rows_written: 0,
        })
    }

    /// Get number of rows written so far
    pub fn rows_written(&self) -> u64 {
        self.rows_written
    }
}

impl RowsWriter for CsvRowsWriter {
    fn write_row(&mut self, row: &NormalizedRow) -> OutputResult<()> {
        match &self.headers {
            None => {
                let headers = row.headers();
                self.writer
                    .write_record(&headers)
                    .map_err(|e| OutputError::Csv(format!("Failed to write header: {}", e)))?;
                self.headers = Some(headers);
            }
            Some(expected) => {
                let found = row.headers();
                if &found != expected {
                    return Err(OutputError::SchemaMismatch {
                        row: self.rows_written as usize,
                        expected: expected.clone(),
                        found,
                    });
                }
            }
        }

        self.writer
            .write_record(row.rendered())
            .map_err(|e| OutputError::Csv(format!("Failed to write row: {}", e)))?;

        self.rows_written += 1;

        if self.rows_written % 1000 == 0 {
            self.flush()?;
            debug!("Progress: {} rows written", self.rows_written);
        }

        Ok(())
    }
}

impl OutputWriter for CsvRowsWriter {
    fn flush(&mut self) -> OutputResult<()> {
        self.writer
            .flush()
            .map_err(|e| OutputError::Io(format!("Failed to flush: {}", e)))
    }

    fn close(mut self) -> OutputResult<()> {
        debug!("Closing CSV writer: {} total rows written", self.rows_written);

        self.flush()?;

        let buf_writer = self
            .writer
            .into_inner()
            .map_err(|e| OutputError::Io(format!("Failed to get inner writer: {}", e)))?;

        let file = buf_writer
            .into_inner()
            .map_err(|e| OutputError::Io(format!("Failed to get file handle: {}", e)))?;

        file.sync_all()
            .map_err(|e| OutputError::Io(format!("Failed to sync file: {}", e)))?;

        info!("CSV writer closed successfully: {} rows written", self.rows_written);
        Ok(())
    }
}

/// Write `rows` to `path` as CSV and return the number of rows written
///
/// Fails without touching the destination when `rows` is empty or the rows
/// disagree on their columns. The parent directory is never created.
pub fn export_csv<P: AsRef<Path>>(rows: &[NormalizedRow], path: P) -> OutputResult<usize> {
    let first = rows.first().ok_or(OutputError::EmptyInput)?;

    if let Some((idx, row)) = rows.iter().enumerate().find(|(_, r)| !first.same_columns(r)) {
        return Err(OutputError::SchemaMismatch {
            row: idx,
            expected: first.headers(),
            found: row.headers(),
        });
    }

    let mut writer = CsvRowsWriter::new(path)?;
    writer.write_rows(rows)?;
    writer.close()?;

    Ok(rows.len())
}
