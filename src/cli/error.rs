//! CLI error types and exit codes

use std::path::PathBuf;

use crate::downloader::ExportError;
use crate::fetcher::FetcherError;
use crate::output::OutputError;
use crate::WindowError;

/// Process exit codes
pub mod exit_code {
    /// Success
    pub const OK: i32 = 0;
    /// Invalid arguments or unexpected failure
    pub const INVALID: i32 = 1;
    /// No access token supplied
    pub const MISSING_TOKEN: i32 = 2;
    /// Token rejected, or a health check failed
    pub const AUTH_FAILED: i32 = 3;
    /// Rate limited (partial data may have been written)
    pub const RATE_LIMITED: i32 = 4;
    /// Network failure (partial data may have been written)
    pub const TRANSIENT: i32 = 5;
    /// Export could not be written
    pub const EXPORT_IO: i32 = 6;
}

/// CLI errors
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// No token from flag or environment
    #[error("STRAVA_ACCESS_TOKEN is not set (use --access-token or the environment variable)")]
    MissingToken,

    /// Invalid argument
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Client could not be set up
    #[error("fetcher error: {0}")]
    FetcherError(#[from] FetcherError),

    /// Export job or output failure
    #[error("export error: {0}")]
    ExportError(#[from] ExportError),

    /// Token rejected during export
    #[error("authentication failed (401); no data was written")]
    AuthFailed,

    /// Throttled during export
    #[error("rate limited after {records} activities; {}", partial_note(.output_path))]
    RateLimited {
        /// Records fetched before throttling
        records: usize,
        /// File holding the partial export, if any
        output_path: Option<PathBuf>,
    },

    /// Network failure during export
    #[error("fetch interrupted after {records} activities ({reason}); {}", partial_note(.output_path))]
    Transient {
        /// Why the fetch stopped
        reason: String,
        /// Records fetched before the failure
        records: usize,
        /// File holding the partial export, if any
        output_path: Option<PathBuf>,
    },

    /// One or more health checks failed
    #[error("one or more health checks failed")]
    HealthCheckFailed,
}

impl From<WindowError> for CliError {
    fn from(err: WindowError) -> Self {
        CliError::InvalidArgument(err.to_string())
    }
}

fn partial_note(path: &Option<PathBuf>) -> String {
    match path {
        Some(p) => format!("partial results written to {}", p.display()),
        None => "nothing was written".to_string(),
    }
}

impl CliError {
    /// Exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::MissingToken => exit_code::MISSING_TOKEN,
            CliError::InvalidArgument(_) => exit_code::INVALID,
            CliError::FetcherError(FetcherError::Unauthorized { .. }) => exit_code::AUTH_FAILED,
            CliError::FetcherError(FetcherError::RateLimited) => exit_code::RATE_LIMITED,
            CliError::FetcherError(FetcherError::InvalidConfig(_)) => exit_code::INVALID,
            CliError::FetcherError(_) => exit_code::TRANSIENT,
            CliError::ExportError(ExportError::Output(_)) => exit_code::EXPORT_IO,
            CliError::ExportError(ExportError::InvalidJob(_)) => exit_code::INVALID,
            CliError::AuthFailed | CliError::HealthCheckFailed => exit_code::AUTH_FAILED,
            CliError::RateLimited { .. } => exit_code::RATE_LIMITED,
            CliError::Transient { .. } => exit_code::TRANSIENT,
        }
    }

    /// Hint shown after the error message, if there is one
    pub fn remediation(&self) -> Option<&'static str> {
        match self {
            CliError::MissingToken => {
                Some("Export STRAVA_ACCESS_TOKEN=<token> or pass --access-token")
            }
            CliError::FetcherError(e) => Some(e.remediation()),
            CliError::AuthFailed => Some(FetcherError::Unauthorized { body: String::new() }.remediation()),
            CliError::RateLimited { .. } => Some(FetcherError::RateLimited.remediation()),
            CliError::Transient { .. } => Some(FetcherError::Network(String::new()).remediation()),
            CliError::ExportError(ExportError::Output(OutputError::Io(_))) => {
                Some("Check that the output directory exists and is writable")
            }
            _ => None,
        }
    }
}
