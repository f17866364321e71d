//! Tracing subscriber setup
//!
//! The binary logs to stderr so stdout stays machine-readable. `RUST_LOG`
//! overrides [`DEFAULT_LOG_FILTER`] and `LOG_FORMAT=json` switches to one JSON
//! object per line.

use tracing::subscriber::SetGlobalDefaultError;
use tracing::Subscriber;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset or invalid (library and binary targets)
pub const DEFAULT_LOG_FILTER: &str = "strava_activity_extractor=info,strava_extractor=info";

/// Log line format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Text,
    /// One JSON object per line
    Json,
}

impl LogFormat {
    /// Format selected by the `LOG_FORMAT` environment variable
    pub fn from_env() -> Self {
        Self::from_setting(std::env::var("LOG_FORMAT").ok().as_deref())
    }

    /// `json` (any case) selects JSON; anything else, or nothing, is text
    pub fn from_setting(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some(v) if v.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Text,
        }
    }
}

/// `RUST_LOG` if set and valid, otherwise [`DEFAULT_LOG_FILTER`]
pub fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
}

/// Build a fmt subscriber writing to `writer`
pub fn build_subscriber<W>(
    format: LogFormat,
    filter: EnvFilter,
    writer: W,
) -> Box<dyn Subscriber + Send + Sync>
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer);

    match format {
        LogFormat::Json => Box::new(builder.json().finish()),
        LogFormat::Text => Box::new(builder.finish()),
    }
}

/// Install the process-wide subscriber, logging to stderr
///
/// # Errors
/// Fails if a global subscriber is already installed.
pub fn init_tracing(format: LogFormat, filter: EnvFilter) -> Result<(), SetGlobalDefaultError> {
    tracing::subscriber::set_global_default(build_subscriber(format, filter, std::io::stderr))
}
