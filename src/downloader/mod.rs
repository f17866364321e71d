//! Export orchestration
//!
//! Ties the fetch engine, the normalizer and the CSV writer together.
//!
//! 1. **Job Creation**: Describe the export with [`job::ExportJob`]
//! 2. **Execution**: Run it with [`executor::ExportExecutor`]
//! 3. **Progress Tracking**: Observe [`FetchEvent`](crate::fetcher::pagination::FetchEvent)s,
//!    summarised by [`progress::ProgressState`]
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use strava_activity_extractor::downloader::{ExportExecutor, ExportJob};
//! use strava_activity_extractor::fetcher::strava_config::ClientConfig;
//! use strava_activity_extractor::fetcher::strava_http::StravaHttpClient;
//! use strava_activity_extractor::DateWindow;
//! use chrono::Utc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = StravaHttpClient::new(ClientConfig::new("token"))?;
//! let window = DateWindow::last_days(Utc::now(), 30)?;
//! let job = ExportJob::new(window, "./activities.csv".into());
//!
//! let executor = ExportExecutor::new(Arc::new(client));
//! let report = executor.execute(&job, |_| {}).await?;
//! println!("{} rows written", report.rows_written);
//! # Ok(())
//! # }
//! ```
//!
//! # Error Handling
//!
//! Fetch failures are not errors: they are reported through
//! [`job::ExportReport::outcome`]. Only an invalid job or a failed write
//! returns `Err(ExportError)`.

pub mod executor;
pub mod job;
pub mod progress;

pub use executor::ExportExecutor;
pub use job::{ExportJob, ExportReport};

use crate::output::OutputError;

/// Export errors
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// Job parameters rejected before fetching
    #[error("invalid export job: {0}")]
    InvalidJob(String),

    /// Writing the CSV file failed
    #[error("output error: {0}")]
    Output(#[from] OutputError),
}
