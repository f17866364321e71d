//! Integration tests for logging and tracing
//!
//! Subscribers built by `logging::build_subscriber` write into an in-memory
//! buffer, installed per test with `set_default`/`with_default`.

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex};
use strava_activity_extractor::fetcher::pagination::fetch_activities;
use strava_activity_extractor::fetcher::{ActivitySource, FetcherError, FetcherResult, PageQuery};
use strava_activity_extractor::logging::{build_subscriber, LogFormat, DEFAULT_LOG_FILTER};
use strava_activity_extractor::{ActivityRecord, DateWindow};
use tracing_subscriber::EnvFilter;

/// Shared byte buffer handed out as a `MakeWriter`
#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    fn make_writer(&self) -> impl Fn() -> CapturedLogs + Send + Sync + 'static {
        let logs = self.clone();
        move || logs.clone()
    }

    fn text(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }

    fn json_lines(&self) -> Vec<Value> {
        self.text()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }
}

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn default_filter() -> EnvFilter {
    EnvFilter::new(DEFAULT_LOG_FILTER)
}

#[test]
fn test_json_format_emits_one_object_per_line() {
    let logs = CapturedLogs::default();
    let subscriber = build_subscriber(LogFormat::Json, default_filter(), logs.make_writer());

    tracing::subscriber::with_default(subscriber, || {
        tracing::info!(
            target: "strava_activity_extractor::fetcher::pagination",
            page = 1,
            page_records = 200,
            "Received page"
        );
        tracing::warn!(
            target: "strava_activity_extractor::downloader::executor",
            records = 200,
            "Fetch stopped early, exporting partial results"
        );
    });

    let lines = logs.json_lines();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["level"], json!("INFO"));
    assert_eq!(lines[0]["target"], json!("strava_activity_extractor::fetcher::pagination"));
    assert_eq!(lines[0]["fields"]["message"], json!("Received page"));
    assert_eq!(lines[0]["fields"]["page"], json!(1));
    assert_eq!(lines[1]["level"], json!("WARN"));
    assert_eq!(lines[1]["fields"]["records"], json!(200));
}

#[test]
fn test_default_filter_keeps_info_from_crate_only() {
    let logs = CapturedLogs::default();
    let subscriber = build_subscriber(LogFormat::Json, default_filter(), logs.make_writer());

    tracing::subscriber::with_default(subscriber, || {
        tracing::debug!(target: "strava_activity_extractor::fetcher", "Fetching activities page");
        tracing::info!(target: "hyper::client", "connection established");
        tracing::info!(target: "strava_activity_extractor::fetcher", "Fetch finished");
        tracing::error!(target: "strava_extractor", "Command failed");
    });

    let messages: Vec<Value> = logs
        .json_lines()
        .iter()
        .map(|line| line["fields"]["message"].clone())
        .collect();
    assert_eq!(messages, vec![json!("Fetch finished"), json!("Command failed")]);
}

#[test]
fn test_custom_filter_enables_debug() {
    let logs = CapturedLogs::default();
    let filter = EnvFilter::new("strava_activity_extractor::fetcher=debug");
    let subscriber = build_subscriber(LogFormat::Json, filter, logs.make_writer());

    tracing::subscriber::with_default(subscriber, || {
        tracing::debug!(target: "strava_activity_extractor::fetcher", "Fetching activities page");
        tracing::debug!(target: "strava_activity_extractor::output::csv", "CSV writer created");
    });

    let lines = logs.json_lines();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["level"], json!("DEBUG"));
}

#[test]
fn test_text_format_is_not_json() {
    let logs = CapturedLogs::default();
    let subscriber = build_subscriber(LogFormat::Text, default_filter(), logs.make_writer());

    tracing::subscriber::with_default(subscriber, || {
        tracing::info!(target: "strava_activity_extractor::health", "Athlete profile retrieved");
    });

    let text = logs.text();
    assert!(text.contains("Athlete profile retrieved"));
    assert!(serde_json::from_str::<Value>(text.trim()).is_err());
}

/// Source returning two pages of records, then an empty page
struct TwoPages(Mutex<VecDeque<FetcherResult<Vec<ActivityRecord>>>>);

#[async_trait]
impl ActivitySource for TwoPages {
    async fn fetch_page(&self, _query: &PageQuery) -> FetcherResult<Vec<ActivityRecord>> {
        self.0
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(FetcherError::Network("unexpected request".into())))
    }
}

fn activity(id: i64) -> ActivityRecord {
    json!({"id": id}).as_object().cloned().unwrap()
}

/// The summary line counts pages with records, separately from the last page requested
#[tokio::test]
async fn test_fetch_summary_reports_pages_fetched() {
    let logs = CapturedLogs::default();
    let subscriber = build_subscriber(LogFormat::Json, default_filter(), logs.make_writer());
    let _guard = tracing::subscriber::set_default(subscriber);

    let source = TwoPages(Mutex::new(VecDeque::from(vec![
        Ok(vec![activity(1), activity(2)]),
        Ok(vec![activity(3)]),
        Ok(vec![]),
    ])));
    let window = DateWindow::new(
        Utc.with_ymd_and_hms(2025, 11, 1, 0, 0, 0).unwrap(),
        Utc.with_ymd_and_hms(2025, 11, 24, 23, 59, 59).unwrap(),
    )
    .unwrap();

    let outcome = fetch_activities(&source, &window, 2, None).await;
    assert_eq!(outcome.record_count(), 3);

    let summary = logs
        .json_lines()
        .into_iter()
        .find(|line| line["fields"]["message"] == json!("Fetch finished"))
        .unwrap();
    assert_eq!(summary["fields"]["outcome"], json!("complete"));
    assert_eq!(summary["fields"]["records"], json!(3));
    assert_eq!(summary["fields"]["pages"], json!(2));
    assert_eq!(summary["fields"]["last_page"], json!(3));
}
