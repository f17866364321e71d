//! Export job definition and report

use serde::Serialize;
use std::path::PathBuf;

use crate::fetcher::strava_config::MAX_PER_PAGE;
use crate::fetcher::OutcomeKind;
use crate::normalize::Fieldset;
use crate::DateWindow;

/// One fetch, normalize and export cycle
#[derive(Debug, Clone, Serialize)]
pub struct ExportJob {
    /// Inclusive time window
    pub window: DateWindow,
    /// Records per page (clamped into `1..=200` at fetch time)
    pub page_size: u32,
    /// Optional total record cap
    pub max_records: Option<usize>,
    /// Output columns
    pub fieldset: Fieldset,
    /// Destination CSV file
    pub output_path: PathBuf,
}

impl ExportJob {
    /// Job with the maximum page size, no cap and the extended fieldset
    pub fn new(window: DateWindow, output_path: PathBuf) -> Self {
        Self {
            window,
            page_size: MAX_PER_PAGE,
            max_records: None,
            fieldset: Fieldset::default(),
            output_path,
        }
    }

    /// Set the page size
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    /// Set the record cap
    pub fn with_max_records(mut self, max_records: Option<usize>) -> Self {
        self.max_records = max_records;
        self
    }

    /// Set the fieldset
    pub fn with_fieldset(mut self, fieldset: Fieldset) -> Self {
        self.fieldset = fieldset;
        self
    }

    /// Validate job parameters
    pub fn validate(&self) -> Result<(), String> {
        if self.output_path.as_os_str().is_empty() {
            return Err("Output path cannot be empty".to_string());
        }
        if self.output_path.file_name().is_none() {
            return Err(format!(
                "Output path {} does not name a file",
                self.output_path.display()
            ));
        }
        Ok(())
    }
}

/// Result of an executed [`ExportJob`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportReport {
    /// How the fetch ended
    pub outcome: OutcomeKind,
    /// Pages that contributed records
    pub pages_fetched: u32,
    /// Records returned by the fetch
    pub records_fetched: usize,
    /// Rows written to the CSV file
    pub rows_written: usize,
    /// Destination, present only when rows were written
    pub output_path: Option<PathBuf>,
    /// Why the fetch stopped early, if it did
    pub failure: Option<String>,
}

impl ExportReport {
    /// True when the fetch completed normally
    pub fn is_complete(&self) -> bool {
        self.outcome == OutcomeKind::Complete
    }

    /// True when a non-complete fetch still produced a file
    pub fn is_partial(&self) -> bool {
        !self.is_complete() && self.rows_written > 0
    }
}
