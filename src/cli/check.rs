//! Health check subcommand

use clap::Parser;

use super::export::{Cli, OutputFormat};
use super::CliError;
use crate::health::{run_health_check, CheckStatus, HealthReport};

/// Check command verifying the access token and API connectivity
#[derive(Parser, Debug)]
pub struct CheckCommand {}

impl CheckCommand {
    /// Execute the health check
    ///
    /// Both checks always run; the command fails if either one does.
    pub async fn execute(&self, cli: &Cli) -> Result<HealthReport, CliError> {
        let client = cli.build_client()?;
        let report = run_health_check(&client).await;

        match cli.output_format {
            OutputFormat::Json => {
                let output = serde_json::json!({
                    "passed": report.passed(),
                    "base_url": client.config().base_url(),
                    "athlete": report.athlete,
                    "activities": report.activities,
                });
                println!("{output}");
            }
            OutputFormat::Human => print_human(&report),
        }

        if report.passed() {
            Ok(report)
        } else {
            Err(CliError::HealthCheckFailed)
        }
    }
}

fn print_human(report: &HealthReport) {
    println!("=== Strava API Health Check ===");

    match (&report.athlete.status, &report.athlete.athlete) {
        (CheckStatus::Passed, Some(athlete)) => {
            println!("[OK] Authentication OK, athlete profile retrieved.");
            println!("     Athlete: {} (id={})", athlete.display_name(), athlete.id);
        }
        (CheckStatus::Passed, None) => println!("[OK] Authentication OK."),
        (CheckStatus::Failed { error, remediation }, _) => {
            println!("[FAIL] Athlete endpoint: {error}");
            println!("       {remediation}");
        }
    }

    match &report.activities.status {
        CheckStatus::Passed => {
            println!(
                "[OK] Activities endpoint reachable. Activities returned: {}",
                report.activities.count
            );
            if let Some(sample) = &report.activities.sample {
                println!(
                    "     Sample: id={} name=\"{}\" date={}",
                    sample.id.map(|id| id.to_string()).unwrap_or_default(),
                    sample.name.as_deref().unwrap_or_default(),
                    sample.start_date.as_deref().unwrap_or_default()
                );
            }
        }
        CheckStatus::Failed { error, remediation } => {
            println!("[FAIL] Activities endpoint: {error}");
            println!("       {remediation}");
        }
    }

    if report.passed() {
        println!("\nAll checks passed. The extractor can communicate with the Strava API.");
    } else {
        println!("\nOne or more checks failed. See messages above to troubleshoot.");
    }
}
