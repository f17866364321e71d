//! Output path helpers
//!
//! Default export filenames are derived from the date window:
//! `strava_{YYYYMMDD}_{YYYYMMDD}.csv`.
//!
//! ```rust
//! use strava_activity_extractor::output::path::default_filename;
//! use strava_activity_extractor::DateWindow;
//! use chrono::{TimeZone, Utc};
//!
//! let window = DateWindow::new(
//!     Utc.with_ymd_and_hms(2025, 11, 1, 0, 0, 0).unwrap(),
//!     Utc.with_ymd_and_hms(2025, 11, 24, 0, 0, 0).unwrap(),
//! )
//! .unwrap();
//! assert_eq!(default_filename(&window), "strava_20251101_20251124.csv");
//! ```

use std::path::{Path, PathBuf};

use crate::DateWindow;

const CSV_EXTENSION: &str = "csv";

/// Filename for an export covering `window`
pub fn default_filename(window: &DateWindow) -> String {
    format!(
        "strava_{}_{}.{}",
        window.start().format("%Y%m%d"),
        window.end().format("%Y%m%d"),
        CSV_EXTENSION
    )
}

/// Append `.csv` unless the path already ends with it (case-insensitive)
pub fn ensure_csv_extension(path: &Path) -> PathBuf {
    let has_csv = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(CSV_EXTENSION));

    if has_csv {
        return path.to_path_buf();
    }

    let mut name = path.as_os_str().to_os_string();
    name.push(".");
    name.push(CSV_EXTENSION);
    PathBuf::from(name)
}

/// Resolve the destination of an export
///
/// An explicit `output` wins (with `.csv` appended if missing); otherwise the
/// default filename is placed in `output_dir`.
pub fn resolve_output_path(output: Option<&Path>, output_dir: &Path, window: &DateWindow) -> PathBuf {
    match output {
        Some(path) => ensure_csv_extension(path),
        None => output_dir.join(default_filename(window)),
    }
}
