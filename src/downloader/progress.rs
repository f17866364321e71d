//! Progress tracking for paginated fetches.
//!
//! Folds [`FetchEvent`]s into a running [`ProgressState`] and decides when a
//! user-facing progress line is worth logging. Without a record cap there is
//! no known total, so updates are time based; with a cap they also fire on
//! percentage steps.

use std::time::{Duration, Instant};

use crate::fetcher::pagination::FetchEvent;

const DEFAULT_UPDATE_INTERVAL: Duration = Duration::from_secs(15);
const MIN_FETCH_DURATION: Duration = Duration::from_secs(5);

/// Cadence settings shared by every fetch an executor runs.
#[derive(Debug, Clone)]
pub struct ProgressTracker {
    update_interval: Duration,
    min_percentage_step: f64,
}

impl ProgressTracker {
    /// Log at most every `update_interval`, or whenever the cap share grows by
    /// `min_percentage_step` points.
    pub fn new(update_interval: Duration, min_percentage_step: f64) -> Self {
        Self {
            update_interval,
            min_percentage_step,
        }
    }

    /// Fresh state for one fetch.
    pub fn create_state(&self, record_cap: Option<usize>) -> ProgressState {
        let mut state = ProgressState::new(record_cap);
        state.update_interval = self.update_interval;
        state.min_percentage_step = self.min_percentage_step;
        state
    }
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::new(DEFAULT_UPDATE_INTERVAL, 25.0)
    }
}

/// Running totals of one fetch.
#[derive(Debug, Clone)]
pub struct ProgressState {
    /// Records accumulated so far.
    pub records_fetched: u64,
    /// Pages that contributed records.
    pub pages_fetched: u32,
    /// Record cap, if any.
    pub record_cap: Option<u64>,
    /// When the fetch started.
    pub start_time: Instant,
    /// When the last progress line was logged.
    pub last_update: Instant,
    /// Time between progress lines without a cap step.
    pub update_interval: Duration,
    /// Records per second since start.
    pub current_rate: f64,
    /// Last reported percentage of the cap.
    pub last_reported_percentage: f64,
    /// Cap share, in points, that forces a progress line.
    pub min_percentage_step: f64,
    /// Set once a `Finished` event was observed.
    pub finished: bool,
}

impl ProgressState {
    /// Create a state with default intervals. `Some(0)` counts as no cap.
    pub fn new(record_cap: Option<usize>) -> Self {
        let now = Instant::now();
        Self {
            records_fetched: 0,
            pages_fetched: 0,
            record_cap: record_cap.filter(|&n| n > 0).map(|n| n as u64),
            start_time: now,
            last_update: now,
            update_interval: DEFAULT_UPDATE_INTERVAL,
            current_rate: 0.0,
            last_reported_percentage: 0.0,
            min_percentage_step: 25.0,
            finished: false,
        }
    }

    /// Fold one event into the totals.
    pub fn observe(&mut self, event: &FetchEvent) {
        match *event {
            FetchEvent::Page { total_records, .. } => {
                self.pages_fetched = self.pages_fetched.saturating_add(1);
                self.records_fetched = total_records as u64;
            }
            FetchEvent::Finished { total_records, .. } => {
                self.records_fetched = total_records as u64;
                self.finished = true;
            }
        }

        let elapsed = self.start_time.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            self.current_rate = self.records_fetched as f64 / elapsed;
        }
    }

    /// True when a progress line is due.
    pub fn should_emit_update(&self) -> bool {
        if self.records_fetched == 0 || self.finished {
            return false;
        }

        let percentage_jump = self
            .percentage()
            .map(|pct| pct - self.last_reported_percentage >= self.min_percentage_step)
            .unwrap_or(false);

        if percentage_jump {
            return true;
        }

        self.start_time.elapsed() >= MIN_FETCH_DURATION
            && self.last_update.elapsed() >= self.update_interval
    }

    /// Record that a progress line was just logged.
    pub fn mark_emitted(&mut self) {
        self.last_update = Instant::now();
        if let Some(pct) = self.percentage() {
            self.last_reported_percentage = pct;
        }
    }

    /// Percentage of the record cap reached, when a cap is set.
    pub fn percentage(&self) -> Option<f64> {
        self.record_cap
            .map(|cap| ((self.records_fetched as f64 / cap as f64) * 100.0).min(100.0))
    }

    /// Time since the fetch started.
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Progress line for the log.
    pub fn format_progress(&self) -> String {
        let mut parts = vec![format!(
            "[PROGRESS] Fetched {} {} over {} {}",
            self.records_fetched,
            plural(self.records_fetched, "activity", "activities"),
            self.pages_fetched,
            plural(u64::from(self.pages_fetched), "page", "pages"),
        )];

        if let Some(pct) = self.percentage() {
            parts.push(format!("- {pct:.1}% of cap"));
        }

        if self.current_rate > 0.0 {
            parts.push(format!("at {:.0} activities/sec", self.current_rate));
        }

        parts.push(format!("({} elapsed)", format_duration(self.elapsed())));

        parts.join(" ")
    }
}

fn plural(n: u64, one: &'static str, many: &'static str) -> &'static str {
    if n == 1 {
        one
    } else {
        many
    }
}

/// Compact duration for progress lines (`42s`, `3m`, `1.5h`).
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs < 60 {
        format!("{secs}s")
    } else if secs < 3600 {
        format!("{}m", secs / 60)
    } else {
        format!("{:.1}h", secs as f64 / 3600.0)
    }
}
