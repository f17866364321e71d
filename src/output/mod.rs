//! Data output writers

use crate::normalize::NormalizedRow;

pub mod csv;
pub mod path;

/// Output writer errors
#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    /// Nothing to export
    #[error("no rows to export")]
    EmptyInput,

    /// A row's columns differ from the header
    #[error("row {row} has columns {found:?}, expected {expected:?}")]
    SchemaMismatch {
        /// 0-based row index
        row: usize,
        /// Header columns
        expected: Vec<&'static str>,
        /// Columns of the offending row
        found: Vec<&'static str>,
    },

    /// Destination could not be opened, written or synced
    #[error("IO error: {0}")]
    Io(String),

    /// CSV encoding error
    #[error("CSV error: {0}")]
    Csv(String),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Generic output writer trait
pub trait OutputWriter {
    /// Flush any buffered data to disk
    fn flush(&mut self) -> OutputResult<()>;

    /// Close the writer and finalize output
    fn close(self) -> OutputResult<()>;
}

/// Trait for writing normalized rows
pub trait RowsWriter: OutputWriter {
    /// Write a single row
    fn write_row(&mut self, row: &NormalizedRow) -> OutputResult<()>;

    /// Write multiple rows at once
    fn write_rows(&mut self, rows: &[NormalizedRow]) -> OutputResult<()> {
        for row in rows {
            self.write_row(row)?;
        }
        Ok(())
    }
}
