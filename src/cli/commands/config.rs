//! `onerep config`: validate and inspect configuration.

use std::path::PathBuf;

use serde_json::json;

use crate::cli::args::OutputFormat;
use crate::cli::commands::{AppContext, print_json};
use crate::config::{ConfigLoader, ConfigLimits};
use crate::error::{ConfigError, OneRepError, Severity, ValidationIssue};

/// Outcome of validating one file.
#[derive(Debug)]
struct FileReport {
    path: PathBuf,
    issues: Vec<ValidationIssue>,
    fatal: Option<String>,
}

impl FileReport {
    fn failed(&self, strict: bool) -> bool {
        self.fatal.is_some()
            || self
                .issues
                .iter()
                .any(|i| i.severity == Severity::Error || strict)
    }
}

fn check(loader: &ConfigLoader, path: PathBuf) -> FileReport {
    tracing::info!(file = %path.display(), "validating configuration");
    match loader.load(&path) {
        Ok(result) => FileReport {
            path,
            issues: result.warnings,
            fatal: None,
        },
        Err(ConfigError::ValidationError { errors, .. }) => FileReport {
            path,
            issues: errors,
            fatal: None,
        },
        Err(e) => FileReport {
            path,
            issues: Vec::new(),
            fatal: Some(e.to_string()),
        },
    }
}

/// Validates each file and prints a report. `strict` turns warnings into
/// failures.
///
/// # Errors
///
/// Returns [`ConfigError::ValidationError`] naming the first failing file.
pub fn validate(files: &[PathBuf], format: OutputFormat, strict: bool) -> Result<(), OneRepError> {
    let loader = ConfigLoader::new(ConfigLimits::default());
    let reports: Vec<FileReport> = files.iter().cloned().map(|p| check(&loader, p)).collect();

    match format {
        OutputFormat::Human => {
            for report in &reports {
                let status = if report.failed(strict) { "invalid" } else { "ok" };
                println!("{}: {status}", report.path.display());
                if let Some(fatal) = &report.fatal {
                    println!("  {fatal}");
                }
                for issue in &report.issues {
                    println!("  {issue}");
                }
            }
        }
        OutputFormat::Json => {
            let value: Vec<_> = reports
                .iter()
                .map(|r| {
                    let issues: Vec<_> = r
                        .issues
                        .iter()
                        .map(|i| {
                            json!({
                                "path": i.path,
                                "message": i.message,
                                "severity": match i.severity {
                                    Severity::Error => "error",
                                    Severity::Warning => "warning",
                                },
                            })
                        })
                        .collect();
                    json!({
                        "file": r.path.display().to_string(),
                        "valid": !r.failed(strict),
                        "error": r.fatal,
                        "issues": issues,
                    })
                })
                .collect();
            print_json(&value)?;
        }
    }

    match reports.into_iter().find(|r| r.failed(strict)) {
        Some(report) => {
            let mut errors = report.issues;
            if let Some(fatal) = report.fatal {
                errors.push(ValidationIssue {
                    path: String::new(),
                    message: fatal,
                    severity: Severity::Error,
                });
            }
            Err(ConfigError::ValidationError {
                path: report.path.display().to_string(),
                errors,
            }
            .into())
        }
        None => Ok(()),
    }
}

/// Prints the effective configuration, after defaults and env expansion.
///
/// # Errors
///
/// Returns an error if YAML encoding fails.
pub fn show(ctx: &AppContext) -> Result<(), OneRepError> {
    let yaml = serde_yaml::to_string(ctx.config.as_ref())?;
    println!("# data dir: {}", ctx.data_dir.display());
    println!("# profile:  {}", ctx.profile);
    print!("{yaml}");
    Ok(())
}
