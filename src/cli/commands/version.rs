//! Version information display.

use serde::Serialize;

use crate::cli::args::{FormatArgs, OutputFormat};
use crate::cli::commands::print_json;
use crate::error::OneRepError;

#[derive(Debug, Serialize)]
struct VersionInfo {
    name: &'static str,
    version: &'static str,
    description: &'static str,
}

const INFO: VersionInfo = VersionInfo {
    name: env!("CARGO_PKG_NAME"),
    version: env!("CARGO_PKG_VERSION"),
    description: env!("CARGO_PKG_DESCRIPTION"),
};

/// Print version information.
///
/// # Errors
///
/// Returns an error if JSON encoding fails.
pub fn run(args: &FormatArgs) -> Result<(), OneRepError> {
    match args.format {
        OutputFormat::Human => {
            println!("{} {}", INFO.name, INFO.version);
            Ok(())
        }
        OutputFormat::Json => print_json(&INFO),
    }
}
