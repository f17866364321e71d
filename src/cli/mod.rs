//! CLI command implementations

pub mod check;
pub mod error;
pub mod export;

pub use check::CheckCommand;
pub use error::CliError;
pub use export::{Cli, Commands, ExportArgs, OutputFormat};
