//! Export executor
//!
//! Runs one fetch for an [`ExportJob`], then decides what to write:
//! - complete fetch with records: normalize and export
//! - rate limited or transient failure with records: export the partial set
//! - no records, or auth failure: write nothing

use std::sync::Arc;
use tracing::{info, warn};

use crate::downloader::progress::{ProgressState, ProgressTracker};
use crate::downloader::{ExportError, ExportJob, ExportReport};
use crate::fetcher::pagination::{fetch_with_progress, FetchEvent};
use crate::fetcher::{ActivitySource, FetchOutcome};
use crate::normalize::Normalizer;
use crate::output::csv::export_csv;

/// Orchestrates fetch, normalize and export for export jobs
pub struct ExportExecutor {
    source: Arc<dyn ActivitySource>,
    progress_tracker: ProgressTracker,
}

impl ExportExecutor {
    /// Create an executor reading from `source`
    pub fn new(source: Arc<dyn ActivitySource>) -> Self {
        Self {
            source,
            progress_tracker: ProgressTracker::default(),
        }
    }

    /// Override progress tracking configuration.
    pub fn with_progress_tracker(mut self, tracker: ProgressTracker) -> Self {
        self.progress_tracker = tracker;
        self
    }

    /// Execute an export job
    ///
    /// `on_event` receives every [`FetchEvent`] as the fetch progresses.
    ///
    /// # Errors
    /// - `ExportError::InvalidJob` if the job fails validation (nothing is fetched)
    /// - `ExportError::Output` if writing the CSV file fails
    pub async fn execute<F>(&self, job: &ExportJob, mut on_event: F) -> Result<ExportReport, ExportError>
    where
        F: FnMut(&FetchEvent),
    {
        job.validate().map_err(ExportError::InvalidJob)?;

        info!(
            window = %job.window,
            page_size = job.page_size,
            max_records = ?job.max_records,
            fieldset = %job.fieldset,
            output = %job.output_path.display(),
            "Starting export job"
        );

        let mut progress: ProgressState = self.progress_tracker.create_state(job.max_records);
        let outcome = fetch_with_progress(
            self.source.as_ref(),
            &job.window,
            job.page_size,
            job.max_records,
            |event| {
                progress.observe(event);
                if progress.should_emit_update() {
                    info!("{}", progress.format_progress());
                    progress.mark_emitted();
                }
                on_event(event);
            },
        )
        .await;

        let kind = outcome.kind();
        let failure = failure_reason(&outcome);
        let records = outcome.into_records();

        let mut report = ExportReport {
            outcome: kind,
            pages_fetched: progress.pages_fetched,
            records_fetched: records.len(),
            rows_written: 0,
            output_path: None,
            failure,
        };

        if records.is_empty() {
            match &report.failure {
                Some(reason) => warn!(outcome = %kind, reason = %reason, "Nothing to export"),
                None => info!("No activities in window, nothing to export"),
            }
            return Ok(report);
        }

        if report.failure.is_some() {
            warn!(
                outcome = %kind,
                records = records.len(),
                "Fetch stopped early, exporting partial results"
            );
        }

        let rows = Normalizer::new(job.fieldset).normalize_all(&records);
        let written = export_csv(&rows, &job.output_path)?;

        info!(
            rows = written,
            output = %job.output_path.display(),
            elapsed = %crate::downloader::progress::format_duration(progress.elapsed()),
            "Export finished"
        );

        report.rows_written = written;
        report.output_path = Some(job.output_path.clone());
        Ok(report)
    }
}

fn failure_reason(outcome: &FetchOutcome) -> Option<String> {
    match outcome {
        FetchOutcome::Complete(_) => None,
        FetchOutcome::AuthFailed => Some("authentication rejected by upstream".to_string()),
        FetchOutcome::RateLimited(_) => Some("rate limit exceeded".to_string()),
        FetchOutcome::TransientFailure { error, .. } => Some(error.to_string()),
    }
}
