//! Page-number pagination over the activity listing
//!
//! Walks pages 1, 2, 3, ... for a [`DateWindow`] until one of:
//! - the upstream returns an empty page
//! - the optional record cap is reached
//! - a page fails (auth, rate limit, transport)
//!
//! Exactly one request is made per page and pages are awaited strictly in
//! order. Failures are folded into a [`FetchOutcome`] instead of an error.

use tracing::{debug, info, warn};

use crate::fetcher::strava_config::MAX_PER_PAGE;
use crate::fetcher::{ActivitySource, FetchOutcome, FetcherError, OutcomeKind, PageQuery};
use crate::{ActivityRecord, DateWindow};

/// Progress observation emitted by the fetch engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchEvent {
    /// A page contributed records
    Page {
        /// 1-based page number
        page: u32,
        /// Records on this page (before any cap truncation)
        page_records: usize,
        /// Running total after this page
        total_records: usize,
    },
    /// The fetch ended
    Finished {
        /// How it ended
        outcome: OutcomeKind,
        /// Records carried by the outcome
        total_records: usize,
    },
}

/// Clamp a requested page size into `1..=MAX_PER_PAGE`
pub fn clamp_page_size(page_size: u32) -> u32 {
    page_size.clamp(1, MAX_PER_PAGE)
}

/// Fetch every activity in `window`
///
/// See [`fetch_with_progress`].
pub async fn fetch_activities<S>(
    source: &S,
    window: &DateWindow,
    page_size: u32,
    max_records: Option<usize>,
) -> FetchOutcome
where
    S: ActivitySource + ?Sized,
{
    fetch_with_progress(source, window, page_size, max_records, |_| {}).await
}

/// Fetch every activity in `window`, reporting progress to `on_event`
///
/// # Arguments
/// * `source` - Page source (HTTP client or a test double)
/// * `window` - Inclusive time window, sent as `after`/`before` Unix seconds
/// * `page_size` - Records per page, clamped into `1..=200`
/// * `max_records` - Optional total cap; `None` or `Some(0)` means no cap
/// * `on_event` - Called after each page with records and once at the end
///
/// # Returns
/// - `Complete` when a page comes back empty or the cap is reached; capped
///   results hold exactly `max_records` records
/// - `AuthFailed` on a 401, discarding records from earlier pages
/// - `RateLimited` on a 429, with records from earlier pages
/// - `TransientFailure` on any other failure, with records from earlier pages
///
/// # Unbounded requests
/// The page count is bounded only by exhaustion or the cap. A wide window
/// with no cap issues as many requests as the upstream has pages.
pub async fn fetch_with_progress<S, F>(
    source: &S,
    window: &DateWindow,
    page_size: u32,
    max_records: Option<usize>,
    mut on_event: F,
) -> FetchOutcome
where
    S: ActivitySource + ?Sized,
    F: FnMut(&FetchEvent),
{
    let per_page = clamp_page_size(page_size);
    if per_page != page_size {
        debug!(requested = page_size, effective = per_page, "Clamped page size");
    }
    let cap = max_records.filter(|&n| n > 0);

    let mut records: Vec<ActivityRecord> = Vec::new();
    let mut page: u32 = 1;
    let mut pages_fetched: u32 = 0;

    let outcome = loop {
        let query = PageQuery {
            after: window.after_timestamp(),
            before: Some(window.before_timestamp()),
            page,
            per_page,
        };

        debug!(
            page,
            per_page,
            after = query.after,
            before = ?query.before,
            "Fetching activities page"
        );

        let batch = match source.fetch_page(&query).await {
            Ok(batch) => batch,
            Err(FetcherError::Unauthorized { .. }) => {
                warn!(page, discarded = records.len(), "Authentication failed");
                break FetchOutcome::AuthFailed;
            }
            Err(FetcherError::RateLimited) => {
                warn!(page, records = records.len(), "Rate limited, returning partial results");
                break FetchOutcome::RateLimited(records);
            }
            Err(error) => {
                warn!(page, records = records.len(), error = %error, "Page fetch failed");
                break FetchOutcome::TransientFailure { records, error };
            }
        };

        if batch.is_empty() {
            debug!(page, total = records.len(), "Empty page, pagination complete");
            break FetchOutcome::Complete(records);
        }

        let page_records = batch.len();
        pages_fetched += 1;
        records.extend(batch);

        let reached_cap = match cap {
            Some(cap) if records.len() >= cap => {
                records.truncate(cap);
                true
            }
            _ => false,
        };

        debug!(page, page_records, total = records.len(), "Received page");
        on_event(&FetchEvent::Page {
            page,
            page_records,
            total_records: records.len(),
        });

        if reached_cap {
            debug!(page, cap = records.len(), "Record cap reached");
            break FetchOutcome::Complete(records);
        }

        page = page.saturating_add(1);
    };

    info!(
        outcome = %outcome.kind(),
        records = outcome.record_count(),
        pages = pages_fetched,
        last_page = page,
        "Fetch finished"
    );
    on_event(&FetchEvent::Finished {
        outcome: outcome.kind(),
        total_records: outcome.record_count(),
    });

    outcome
}
