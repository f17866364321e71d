//! Integration tests for the strava-extractor binary
//!
//! Tests verify:
//! - exit codes for help, usage errors and a missing token
//! - a full export against a mock API via --api-url
//! - JSON reports on stdout
//! - partial export exit code after rate limiting
//! - JSON log lines on stderr with LOG_FORMAT=json

use assert_cmd::Command;
use serde_json::{json, Value};
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn extractor() -> Command {
    let mut cmd = Command::cargo_bin("strava-extractor").unwrap();
    cmd.env_remove("STRAVA_ACCESS_TOKEN")
        .env_remove("STRAVA_API_URL")
        .env("RUST_LOG", "off");
    cmd
}

/// Run a prepared command off the async runtime so the mock server keeps serving
async fn run(mut cmd: Command) -> std::process::Output {
    tokio::task::spawn_blocking(move || cmd.output().unwrap())
        .await
        .unwrap()
}

#[test]
fn test_help_exits_zero() {
    extractor().arg("--help").assert().success();
    extractor().args(["export", "--help"]).assert().success();
}

#[test]
fn test_usage_error_exits_one() {
    extractor()
        .args(["export", "--fieldset", "minimal"])
        .assert()
        .code(1);
    extractor()
        .args(["export", "--start", "2025-11-01", "--last-days", "3"])
        .assert()
        .code(1);
}

#[test]
fn test_missing_token_exits_two() {
    let output = extractor()
        .args(["export", "--last-days", "3"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("STRAVA_ACCESS_TOKEN"), "stderr: {}", stderr);
}

#[test]
fn test_json_log_format_on_stderr() {
    let output = extractor()
        .env_remove("RUST_LOG")
        .env("LOG_FORMAT", "json")
        .args(["export", "--last-days", "3"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    let logged: Vec<Value> = stderr
        .lines()
        .filter_map(|line| serde_json::from_str(line).ok())
        .collect();

    let failure = logged
        .iter()
        .find(|line| line["level"] == json!("ERROR"))
        .unwrap_or_else(|| panic!("no JSON error line in stderr: {}", stderr));
    assert_eq!(failure["target"], json!("strava_extractor"));
    assert!(failure["fields"]["message"]
        .as_str()
        .is_some_and(|m| m.starts_with("Command failed")));
}

#[test]
fn test_inverted_window_exits_one() {
    extractor()
        .args([
            "--access-token",
            "abc",
            "export",
            "--start",
            "2025-11-24",
            "--end",
            "2025-11-01",
        ])
        .assert()
        .code(1);
}

#[tokio::test]
async fn test_export_writes_default_filename() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/athlete/activities"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 1, "name": "Commute", "type": "Ride", "distance": 6400.0,
             "moving_time": 1200, "start_date": "2025-11-05T07:30:00Z", "commute": true},
            {"id": 2, "name": "Tempo", "type": "Run", "distance": 12000.0,
             "moving_time": 3000, "start_date": "2025-11-06T18:00:00Z", "commute": false}
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/athlete/activities"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let temp_dir = TempDir::new().unwrap();
    let mut cmd = extractor();
    cmd.env("STRAVA_ACCESS_TOKEN", "test-token").args([
        "--api-url",
        server.uri().as_str(),
        "--output-format",
        "json",
        "export",
        "--start",
        "2025-11-01",
        "--end",
        "2025-11-24",
        "--output-dir",
        temp_dir.path().to_str().unwrap(),
    ]);

    let output = run(cmd).await;
    assert_eq!(output.status.code(), Some(0), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let report: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["success"], json!(true));
    assert_eq!(report["outcome"], json!("complete"));
    assert_eq!(report["rows_written"], json!(2));

    let csv_path = temp_dir.path().join("strava_20251101_20251124.csv");
    let content = std::fs::read_to_string(&csv_path).unwrap();
    assert!(content.starts_with("id,name,type,date,start_time,distance_m,distance_km"));
    assert!(content.contains("1,Commute,Ride,2025-11-05,2025-11-05T07:30:00Z,6400.0,6.4,1200,20.0,"));
}

#[tokio::test]
async fn test_rate_limited_export_exits_four() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/athlete/activities"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 7, "name": "Swim"}])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/athlete/activities"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let temp_dir = TempDir::new().unwrap();
    let output_file = temp_dir.path().join("partial.csv");
    let mut cmd = extractor();
    cmd.args([
        "--access-token",
        "test-token",
        "--api-url",
        server.uri().as_str(),
        "export",
        "--last-days",
        "30",
        "--per-page",
        "1",
        "-o",
        output_file.to_str().unwrap(),
    ]);

    let output = run(cmd).await;

    assert_eq!(output.status.code(), Some(4));
    assert!(output_file.exists());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("partial.csv"), "stderr: {}", stderr);
}

#[tokio::test]
async fn test_check_with_rejected_token_exits_three() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let mut cmd = extractor();
    cmd.args([
        "--access-token",
        "expired",
        "--api-url",
        server.uri().as_str(),
        "--output-format",
        "json",
        "check",
    ]);

    let output = run(cmd).await;

    assert_eq!(output.status.code(), Some(3));
    let report: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["passed"], json!(false));
}
