//! # Strava Activity Extractor Library
//!
//! Retrieves logged activities from the Strava REST API for a date window,
//! normalizes them into flat rows and exports them to CSV for local analysis.
//!
//! ## Features
//!
//! - **Paginated Fetching**: Walks `/athlete/activities` page by page until the
//!   window is exhausted or an optional record cap is reached
//! - **Partial Results**: Rate limiting and transient network failures return the
//!   records gathered so far instead of an error
//! - **Normalization**: Unit conversions (km, minutes, km/h) with two fieldsets
//!   (`compact` and `extended`)
//! - **CSV Export**: Header derived from the fieldset, RFC 4180 quoting, UTF-8
//! - **Health Check**: Verifies the access token against the athlete endpoint
//!
//! ## Quick Start
//!
//! ```no_run
//! use strava_activity_extractor::fetcher::pagination::fetch_activities;
//! use strava_activity_extractor::fetcher::strava_config::ClientConfig;
//! use strava_activity_extractor::fetcher::strava_http::StravaHttpClient;
//! use strava_activity_extractor::normalize::{Fieldset, Normalizer};
//! use strava_activity_extractor::output::csv::export_csv;
//! use strava_activity_extractor::DateWindow;
//! use chrono::{Duration, Utc};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = StravaHttpClient::new(ClientConfig::new("my-token"))?;
//! let end = Utc::now();
//! let window = DateWindow::new(end - Duration::days(7), end)?;
//!
//! let outcome = fetch_activities(&client, &window, 200, None).await;
//! let normalizer = Normalizer::new(Fieldset::Extended);
//! let rows = normalizer.normalize_all(outcome.records());
//! export_csv(&rows, "activities.csv")?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`fetcher`] - Activity source trait, Strava HTTP client and pagination engine
//! - [`normalize`] - Record normalizer with configurable fieldsets
//! - [`output`] - CSV row export and output path helpers
//! - [`downloader`] - Export jobs tying fetch, normalize and export together
//! - [`health`] - Token and connectivity health check
//! - [`logging`] - Tracing subscriber setup for the binary
//! - [`cli`] - Command line front end

#![warn(missing_docs)]
#![warn(clippy::all)]

use chrono::{DateTime, Utc};
use serde::Serialize;

/// CLI command implementations
pub mod cli;

/// Export orchestration
pub mod downloader;

/// Activity sources and pagination
pub mod fetcher;

/// Token and connectivity health check
pub mod health;

/// Tracing subscriber setup
pub mod logging;

/// Record normalization
pub mod normalize;

/// Data output writers
pub mod output;

pub use fetcher::{FetchOutcome, OutcomeKind};
pub use normalize::{Fieldset, NormalizedRow, Normalizer};

/// One activity exactly as returned by the upstream API.
///
/// Fields may be absent; values are arbitrary JSON scalars.
pub type ActivityRecord = serde_json::Map<String, serde_json::Value>;

/// Errors raised when constructing a [`DateWindow`]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WindowError {
    /// Start instant lies after the end instant
    #[error("window start ({start}) must not be after end ({end})")]
    Inverted {
        /// Requested start
        start: DateTime<Utc>,
        /// Requested end
        end: DateTime<Utc>,
    },

    /// Look-back reaches outside the representable date range
    #[error("cannot look back {days} days from {end}")]
    OutOfRange {
        /// Requested look-back
        days: u32,
        /// Window end
        end: DateTime<Utc>,
    },
}

/// Inclusive time window bounding which activities are requested.
///
/// Both instants are stored in UTC. `start <= end` always holds for a
/// constructed window, so the fetch layer never re-checks ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateWindow {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl DateWindow {
    /// Create a window, rejecting a start that lies after the end
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, WindowError> {
        if start > end {
            return Err(WindowError::Inverted { start, end });
        }
        Ok(Self { start, end })
    }

    /// Window covering the `days` days up to `end`
    pub fn last_days(end: DateTime<Utc>, days: u32) -> Result<Self, WindowError> {
        let start = chrono::Duration::try_days(i64::from(days))
            .and_then(|span| end.checked_sub_signed(span))
            .ok_or(WindowError::OutOfRange { days, end })?;
        Ok(Self { start, end })
    }

    /// Start instant
    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    /// End instant
    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    /// Unix seconds passed as the `after` query parameter
    pub fn after_timestamp(&self) -> i64 {
        self.start.timestamp()
    }

    /// Unix seconds passed as the `before` query parameter
    pub fn before_timestamp(&self) -> i64 {
        self.end.timestamp()
    }
}

impl std::fmt::Display for DateWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} to {}",
            self.start.format("%Y-%m-%d"),
            self.end.format("%Y-%m-%d")
        )
    }
}
