//! Main entry point for the strava-extractor CLI

use clap::error::ErrorKind;
use clap::Parser;
use strava_activity_extractor::cli::error::exit_code;
use strava_activity_extractor::cli::{Cli, CliError, Commands};
use strava_activity_extractor::logging::{env_filter, init_tracing, LogFormat};
use tracing::error;

async fn run(cli: &Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Export(ref args) => args.execute(cli).await.map(|_| ())?,
        Commands::Check(ref cmd) => cmd.execute(cli).await.map(|_| ())?,
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(e) = init_tracing(LogFormat::from_env(), env_filter()) {
        eprintln!("Failed to initialize logging: {e}");
    }

    // Usage errors exit with 1; 2 is reserved for a missing token
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let code = match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => exit_code::OK,
                _ => exit_code::INVALID,
            };
            let _ = e.print();
            std::process::exit(code);
        }
    };

    if let Err(e) = run(&cli).await {
        error!("Command failed: {:#}", e);
        eprintln!("Error: {e:#}");

        let cli_error = e.downcast_ref::<CliError>();
        if let Some(hint) = cli_error.and_then(CliError::remediation) {
            eprintln!("Hint: {hint}");
        }
        std::process::exit(cli_error.map_or(exit_code::INVALID, CliError::exit_code));
    }
}
