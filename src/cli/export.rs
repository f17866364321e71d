//! Export command implementation

use chrono::{DateTime, Datelike, Days, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{error, info};

use crate::downloader::{ExportExecutor, ExportJob, ExportReport};
use crate::fetcher::pagination::FetchEvent;
use crate::fetcher::strava_config::{ClientConfig, STRAVA_API_BASE_URL};
use crate::fetcher::strava_http::StravaHttpClient;
use crate::fetcher::OutcomeKind;
use crate::normalize::Fieldset;
use crate::output::path::resolve_output_path;
use crate::{DateWindow, WindowError};

use super::CliError;

/// Window used when no selection flag is given
const DEFAULT_LOOKBACK_DAYS: u32 = 7;
/// Upper bound for `--last-days` (about a century)
const MAX_LOOKBACK_DAYS: u32 = 36_500;
const THIS_MONTH_DAYS: u32 = 30;
const ALL_TIME_DAYS: u32 = 3650;

/// Try to parse datetime from RFC3339 format
///
/// Handles both inputs with and without timezone designators:
/// - "2024-01-01T00:00:00Z" - explicit UTC
/// - "2024-01-01T00:00:00+01:00" - explicit offset
/// - "2024-01-01T00:00:00" - no timezone, assumed UTC
fn try_parse_datetime_rfc3339(input: &str) -> Option<DateTime<Utc>> {
    let input = input.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Some(dt.with_timezone(&Utc));
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(&format!("{input}Z")) {
        return Some(dt.with_timezone(&Utc));
    }

    None
}

/// Parse a start instant from YYYY-MM-DD or RFC3339 datetime format.
///
/// For date-only format, uses start-of-day (00:00:00 UTC).
pub fn parse_start_flexible(input: &str) -> Result<DateTime<Utc>, CliError> {
    if let Some(dt) = try_parse_datetime_rfc3339(input) {
        return Ok(dt);
    }

    let date = NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d")
        .map_err(|e| CliError::InvalidArgument(format!("Invalid start date '{input}': {e}")))?;
    let datetime = date
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| CliError::InvalidArgument("Invalid start date".to_string()))?;
    Ok(datetime.and_utc())
}

/// Parse an end instant from YYYY-MM-DD or RFC3339 datetime format.
///
/// For date-only format, uses end-of-day (23:59:59 UTC) so the specified date
/// is fully included. The API takes whole seconds.
pub fn parse_end_flexible(input: &str) -> Result<DateTime<Utc>, CliError> {
    if let Some(dt) = try_parse_datetime_rfc3339(input) {
        return Ok(dt);
    }

    let date = NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d")
        .map_err(|e| CliError::InvalidArgument(format!("Invalid end date '{input}': {e}")))?;
    let datetime = date
        .and_hms_opt(23, 59, 59)
        .ok_or_else(|| CliError::InvalidArgument("Invalid end date".to_string()))?;
    Ok(datetime.and_utc())
}

/// Named date windows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    /// Monday 00:00 UTC of the current week until now
    ThisWeek,
    /// The last 30 days
    ThisMonth,
    /// The last 3650 days
    AllTime,
}

impl Preset {
    /// Window for this preset ending at `now`
    pub fn window(&self, now: DateTime<Utc>) -> Result<DateWindow, WindowError> {
        match self {
            Preset::ThisWeek => {
                let days_since_monday = now.weekday().num_days_from_monday();
                let monday = now
                    .date_naive()
                    .checked_sub_days(Days::new(u64::from(days_since_monday)))
                    .and_then(|day| day.and_hms_opt(0, 0, 0));
                match monday {
                    Some(start) => DateWindow::new(start.and_utc(), now),
                    None => DateWindow::last_days(now, days_since_monday),
                }
            }
            Preset::ThisMonth => DateWindow::last_days(now, THIS_MONTH_DAYS),
            Preset::AllTime => DateWindow::last_days(now, ALL_TIME_DAYS),
        }
    }
}

impl FromStr for Preset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "this-week" => Ok(Preset::ThisWeek),
            "this-month" => Ok(Preset::ThisMonth),
            "all-time" => Ok(Preset::AllTime),
            _ => Err(format!(
                "Invalid preset: {s}. Valid options: this-week, this-month, all-time"
            )),
        }
    }
}

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// Human-readable output
    Human,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "human" => Ok(OutputFormat::Human),
            _ => Err(format!("Invalid output format: {s}")),
        }
    }
}

/// Strava activity extractor CLI
#[derive(Parser, Debug)]
#[command(name = "strava-extractor")]
#[command(about = "Export Strava activities for a date window to CSV", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Output format (json or human)
    #[arg(long, global = true, default_value = "human")]
    pub output_format: OutputFormat,

    /// Strava access token
    #[arg(long, global = true, env = "STRAVA_ACCESS_TOKEN", hide_env_values = true)]
    pub access_token: Option<String>,

    /// API base URL
    #[arg(long, global = true, env = "STRAVA_API_URL", default_value = STRAVA_API_BASE_URL)]
    pub api_url: String,

    /// Per-request timeout in seconds (default: 10, range: 1-300)
    #[arg(long, global = true, default_value = "10", value_parser = clap::value_parser!(u64).range(1..=300))]
    pub timeout_secs: u64,
}

impl Cli {
    /// Build the HTTP client from the global options
    ///
    /// # Errors
    /// `CliError::MissingToken` when no non-blank token was supplied.
    pub fn build_client(&self) -> Result<StravaHttpClient, CliError> {
        let token = self
            .access_token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(CliError::MissingToken)?;

        let config = ClientConfig::new(token)
            .with_base_url(self.api_url.as_str())
            .with_timeout(std::time::Duration::from_secs(self.timeout_secs));

        Ok(StravaHttpClient::new(config)?)
    }
}

/// CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch activities for a date window and export them to CSV
    Export(ExportArgs),

    /// Verify the access token and API connectivity
    Check(super::CheckCommand),
}

/// Export command arguments
#[derive(Parser, Debug)]
pub struct ExportArgs {
    /// Window start (YYYY-MM-DD or RFC3339)
    #[arg(long, conflicts_with_all = ["last_days", "preset"])]
    pub start: Option<String>,

    /// Window end (YYYY-MM-DD or RFC3339, default: now)
    #[arg(long, requires = "start")]
    pub end: Option<String>,

    /// Export the last N days
    #[arg(long, conflicts_with = "preset", value_parser = clap::value_parser!(u32).range(1..=MAX_LOOKBACK_DAYS as i64))]
    pub last_days: Option<u32>,

    /// Named window: this-week, this-month or all-time
    #[arg(long)]
    pub preset: Option<Preset>,

    /// Activities per page (values above 200 are clamped)
    #[arg(long, default_value = "200")]
    pub per_page: u32,

    /// Stop after this many activities (0 means no limit)
    #[arg(long)]
    pub max_records: Option<usize>,

    /// Column set: compact or extended
    #[arg(long, default_value = "extended")]
    pub fieldset: Fieldset,

    /// Output file (".csv" is appended when missing)
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,

    /// Directory for the default filename
    #[arg(long, default_value = ".")]
    pub output_dir: PathBuf,
}

impl ExportArgs {
    /// Resolve the date window from the selection flags
    ///
    /// Without any selection flag the last 7 days are exported.
    pub fn resolve_window(&self, now: DateTime<Utc>) -> Result<DateWindow, CliError> {
        if let Some(start) = &self.start {
            let start = parse_start_flexible(start)?;
            let end = match &self.end {
                Some(end) => parse_end_flexible(end)?,
                None => now,
            };
            return Ok(DateWindow::new(start, end)?);
        }

        if let Some(days) = self.last_days {
            return Ok(DateWindow::last_days(now, days)?);
        }

        if let Some(preset) = self.preset {
            return Ok(preset.window(now)?);
        }

        Ok(DateWindow::last_days(now, DEFAULT_LOOKBACK_DAYS)?)
    }

    /// Build the export job for `window`
    pub fn build_job(&self, window: DateWindow) -> ExportJob {
        let output_path = resolve_output_path(self.output.as_deref(), &self.output_dir, &window);
        ExportJob::new(window, output_path)
            .with_page_size(self.per_page)
            .with_max_records(self.max_records)
            .with_fieldset(self.fieldset)
    }

    /// Execute the export command
    pub async fn execute(&self, cli: &Cli) -> Result<ExportReport, CliError> {
        let client = cli.build_client()?;
        let window = self.resolve_window(Utc::now())?;
        let job = self.build_job(window);

        info!(window = %job.window, output = %job.output_path.display(), "Exporting activities");

        let executor = ExportExecutor::new(Arc::new(client));
        let spinner = create_spinner(cli.output_format);

        let result = executor
            .execute(&job, |event| update_spinner(&spinner, event))
            .await;

        spinner.finish_and_clear();

        let report = match result {
            Ok(report) => report,
            Err(e) => {
                error!("Export failed: {}", e);
                if cli.output_format == OutputFormat::Json {
                    print_json_error(&job, &e.to_string());
                }
                return Err(e.into());
            }
        };

        match cli.output_format {
            OutputFormat::Json => output_json(&job, &report),
            OutputFormat::Human => output_human(&job, &report),
        }

        report_to_result(report)
    }
}

/// Map a finished report to the command result
pub fn report_to_result(report: ExportReport) -> Result<ExportReport, CliError> {
    match report.outcome {
        OutcomeKind::Complete => Ok(report),
        OutcomeKind::AuthFailed => Err(CliError::AuthFailed),
        OutcomeKind::RateLimited => Err(CliError::RateLimited {
            records: report.records_fetched,
            output_path: report.output_path,
        }),
        OutcomeKind::TransientFailure => Err(CliError::Transient {
            reason: report.failure.unwrap_or_else(|| "unknown error".to_string()),
            records: report.records_fetched,
            output_path: report.output_path,
        }),
    }
}

fn output_json(job: &ExportJob, report: &ExportReport) {
    let output = serde_json::json!({
        "success": report.is_complete(),
        "outcome": report.outcome,
        "window": {
            "start": job.window.start().to_rfc3339(),
            "end": job.window.end().to_rfc3339(),
        },
        "fieldset": job.fieldset,
        "pages_fetched": report.pages_fetched,
        "records_fetched": report.records_fetched,
        "rows_written": report.rows_written,
        "output_path": report.output_path.as_ref().map(|p| p.display().to_string()),
        "error": report.failure,
    });
    println!("{output}");
}

fn print_json_error(job: &ExportJob, error: &str) {
    let output = serde_json::json!({
        "success": false,
        "output_path": job.output_path.display().to_string(),
        "error": error,
    });
    println!("{output}");
}

fn output_human(job: &ExportJob, report: &ExportReport) {
    match report.outcome {
        OutcomeKind::Complete if report.rows_written == 0 => {
            println!("\nNo activities found between {}.", job.window);
        }
        OutcomeKind::Complete => {
            println!("\nExport completed successfully!");
            println!("Window: {}", job.window);
            println!("Activities: {}", report.records_fetched);
            println!("Output: {}", job.output_path.display());
        }
        OutcomeKind::AuthFailed => {
            eprintln!("\nAuthentication failed. Your token may be invalid or expired.");
        }
        OutcomeKind::RateLimited | OutcomeKind::TransientFailure => {
            eprintln!("\nExport stopped early: {}", report.failure.as_deref().unwrap_or("unknown error"));
            match &report.output_path {
                Some(path) => eprintln!(
                    "Partial results ({} activities) written to {}",
                    report.rows_written,
                    path.display()
                ),
                None => eprintln!("No activities were retrieved; nothing was written."),
            }
        }
    }
}

/// Spinner showing page number and running total
fn create_spinner(format: OutputFormat) -> ProgressBar {
    if format == OutputFormat::Json {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}") {
        pb.set_style(style);
    }
    pb.enable_steady_tick(std::time::Duration::from_millis(120));
    pb.set_message("Fetching activities...");
    pb
}

fn update_spinner(pb: &ProgressBar, event: &FetchEvent) {
    match event {
        FetchEvent::Page {
            page,
            total_records,
            ..
        } => pb.set_message(format!("Page {page}: {total_records} activities")),
        FetchEvent::Finished { total_records, .. } => {
            pb.set_message(format!("Fetched {total_records} activities, writing CSV..."))
        }
    }
}
