//! End-to-end export against a mock Strava API
//!
//! Covers fetch, normalize and CSV export through [`ExportExecutor`]:
//! - multi-page fetch written as one CSV file
//! - partial export after rate limiting
//! - auth failure writes nothing
//! - empty window writes nothing

use chrono::{TimeZone, Utc};
use serde_json::{json, Value};
use std::sync::Arc;
use strava_activity_extractor::downloader::{ExportExecutor, ExportJob};
use strava_activity_extractor::fetcher::pagination::FetchEvent;
use strava_activity_extractor::fetcher::strava_config::ClientConfig;
use strava_activity_extractor::fetcher::strava_http::StravaHttpClient;
use strava_activity_extractor::fetcher::OutcomeKind;
use strava_activity_extractor::normalize::Fieldset;
use strava_activity_extractor::DateWindow;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn november() -> DateWindow {
    DateWindow::new(
        Utc.with_ymd_and_hms(2025, 11, 1, 0, 0, 0).unwrap(),
        Utc.with_ymd_and_hms(2025, 11, 24, 23, 59, 59).unwrap(),
    )
    .unwrap()
}

fn activities(start_id: i64, count: i64) -> Value {
    Value::Array(
        (start_id..start_id + count)
            .map(|id| {
                json!({
                    "id": id,
                    "name": format!("Activity {}", id),
                    "type": "Run",
                    "distance": 8000.0,
                    "moving_time": 2400,
                    "elapsed_time": 2500,
                    "start_date": "2025-11-10T07:00:00Z",
                    "average_speed": 3.33,
                    "max_speed": 4.5,
                    "kudos_count": 3,
                })
            })
            .collect(),
    )
}

async fn mount_page(server: &MockServer, page: u32, body: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path("/athlete/activities"))
        .and(query_param("page", page.to_string()))
        .respond_with(body)
        .expect(1)
        .mount(server)
        .await;
}

fn executor_for(server: &MockServer) -> ExportExecutor {
    let client =
        StravaHttpClient::new(ClientConfig::new("test-token").with_base_url(server.uri())).unwrap();
    ExportExecutor::new(Arc::new(client))
}

#[tokio::test]
async fn test_multi_page_export() {
    let server = MockServer::start().await;
    mount_page(&server, 1, ResponseTemplate::new(200).set_body_json(activities(1, 3))).await;
    mount_page(&server, 2, ResponseTemplate::new(200).set_body_json(activities(4, 2))).await;
    mount_page(&server, 3, ResponseTemplate::new(200).set_body_json(json!([]))).await;

    let temp_dir = TempDir::new().unwrap();
    let output = temp_dir.path().join("november.csv");
    let job = ExportJob::new(november(), output.clone())
        .with_page_size(3)
        .with_fieldset(Fieldset::Compact);

    let mut events = Vec::new();
    let report = executor_for(&server)
        .execute(&job, |e| events.push(e.clone()))
        .await
        .unwrap();

    assert_eq!(report.outcome, OutcomeKind::Complete);
    assert_eq!(report.pages_fetched, 2);
    assert_eq!(report.records_fetched, 5);
    assert_eq!(report.rows_written, 5);
    assert_eq!(report.output_path.as_deref(), Some(output.as_path()));
    assert!(matches!(
        events.last(),
        Some(FetchEvent::Finished {
            outcome: OutcomeKind::Complete,
            total_records: 5
        })
    ));

    let content = std::fs::read_to_string(&output).unwrap();
    let lines: Vec<&str> = content.trim_end().split("\r\n").collect();
    assert_eq!(lines.len(), 6);
    assert!(lines[0].starts_with("id,name,distance,moving_time,elapsed_time"));
    assert!(lines[1].starts_with("1,Activity 1,8.0,40.0,2500,"));
    assert!(lines[5].starts_with("5,Activity 5,"));
    assert!(lines[1].contains(",11.99,16.2,"));
}

#[tokio::test]
async fn test_rate_limit_exports_partial_results() {
    let server = MockServer::start().await;
    mount_page(&server, 1, ResponseTemplate::new(200).set_body_json(activities(1, 2))).await;
    mount_page(&server, 2, ResponseTemplate::new(429).set_body_string("Rate Limit Exceeded")).await;

    let temp_dir = TempDir::new().unwrap();
    let output = temp_dir.path().join("partial.csv");
    let job = ExportJob::new(november(), output.clone()).with_page_size(2);

    let report = executor_for(&server).execute(&job, |_| {}).await.unwrap();

    assert_eq!(report.outcome, OutcomeKind::RateLimited);
    assert!(report.is_partial());
    assert_eq!(report.rows_written, 2);
    assert!(report.failure.is_some());

    let mut reader = csv::Reader::from_path(&output).unwrap();
    assert_eq!(reader.records().count(), 2);
}

#[tokio::test]
async fn test_auth_failure_writes_nothing() {
    let server = MockServer::start().await;
    mount_page(&server, 1, ResponseTemplate::new(200).set_body_json(activities(1, 2))).await;
    mount_page(
        &server,
        2,
        ResponseTemplate::new(401).set_body_string(r#"{"message":"Authorization Error"}"#),
    )
    .await;

    let temp_dir = TempDir::new().unwrap();
    let output = temp_dir.path().join("never.csv");
    let job = ExportJob::new(november(), output.clone()).with_page_size(2);

    let report = executor_for(&server).execute(&job, |_| {}).await.unwrap();

    assert_eq!(report.outcome, OutcomeKind::AuthFailed);
    assert_eq!(report.records_fetched, 0);
    assert_eq!(report.output_path, None);
    assert!(!output.exists());
}

#[tokio::test]
async fn test_empty_window_writes_nothing() {
    let server = MockServer::start().await;
    mount_page(&server, 1, ResponseTemplate::new(200).set_body_json(json!([]))).await;

    let temp_dir = TempDir::new().unwrap();
    let output = temp_dir.path().join("empty.csv");
    let job = ExportJob::new(november(), output.clone());

    let report = executor_for(&server).execute(&job, |_| {}).await.unwrap();

    assert!(report.is_complete());
    assert_eq!(report.rows_written, 0);
    assert!(!output.exists());
}

#[tokio::test]
async fn test_record_cap_stops_paging() {
    let server = MockServer::start().await;
    mount_page(&server, 1, ResponseTemplate::new(200).set_body_json(activities(1, 4))).await;

    let temp_dir = TempDir::new().unwrap();
    let output = temp_dir.path().join("capped.csv");
    let job = ExportJob::new(november(), output.clone())
        .with_page_size(4)
        .with_max_records(Some(3));

    let report = executor_for(&server).execute(&job, |_| {}).await.unwrap();

    assert_eq!(report.records_fetched, 3);
    assert_eq!(report.rows_written, 3);
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}
