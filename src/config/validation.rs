//! Configuration validation.
//!
//! Collects every problem in one pass so a user can fix a file in one go.

use reqwest::Url;

use crate::config::schema::{AppConfig, DurationValue};
use crate::error::{Severity, ValidationIssue};
use crate::model::phase::{MAX_REST_SECS, MAX_TIMED_SECS};
use crate::model::{Profile, TimerPhase};

/// Accepted seconds for the timed phases.
pub const TIMED_PHASE_RANGE: std::ops::RangeInclusive<u64> = 1..=MAX_TIMED_SECS as u64;

/// Accepted seconds for rest.
pub const REST_RANGE: std::ops::RangeInclusive<u64> = 0..=MAX_REST_SECS as u64;

/// Accepted seconds for the webhook timeout.
const SYNC_TIMEOUT_RANGE: std::ops::RangeInclusive<u64> = 1..=120;

/// Outcome of a validation pass.
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
}

impl ValidationResult {
    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Semantic checks on a parsed [`AppConfig`].
#[derive(Debug, Default)]
pub struct Validator {
    errors: Vec<ValidationIssue>,
    warnings: Vec<ValidationIssue>,
}

impl Validator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn validate(&mut self, config: &AppConfig) -> ValidationResult {
        self.errors.clear();
        self.warnings.clear();

        self.validate_profile(config);
        self.validate_phases(config);
        self.validate_coach(config);
        self.validate_sync(config);

        ValidationResult {
            errors: std::mem::take(&mut self.errors),
            warnings: std::mem::take(&mut self.warnings),
        }
    }

    fn validate_profile(&mut self, config: &AppConfig) {
        if let Some(n) = config.profile.default {
            if Profile::new(n).is_err() {
                self.add_error("profile.default", &format!("profile {n} does not exist (use 1 or 2)"));
            }
        }
    }

    fn validate_phases(&mut self, config: &AppConfig) {
        for (phase, value) in config.phases.entries() {
            let Some(value) = value else {
                continue;
            };
            let path = format!("phases.{}", phase_key(phase));
            let range = if phase == TimerPhase::Rest {
                REST_RANGE
            } else {
                TIMED_PHASE_RANGE
            };
            self.check_duration(&path, value, &range);
        }

        let rest = config.phases.rest.as_ref().and_then(|v| v.as_secs().ok());
        if rest == Some(0) {
            self.add_warning(
                "phases.rest",
                "rest is disabled; the next exercise starts immediately",
            );
        }
    }

    fn validate_coach(&mut self, config: &AppConfig) {
        let coach = &config.coach;
        for (field, command) in [("coach.player", &coach.player), ("coach.speech", &coach.speech)] {
            if let Some(command) = command {
                if shlex::split(command).is_none_or(|argv| argv.is_empty()) {
                    self.add_error(field, "command line is empty or has unbalanced quotes");
                }
            }
        }
        if let Some(dir) = &coach.asset_dir {
            if !dir.is_dir() {
                self.add_warning(
                    "coach.asset_dir",
                    &format!("{} is not a directory; speech fallback will be used", dir.display()),
                );
            }
        }
    }

    fn validate_sync(&mut self, config: &AppConfig) {
        let Some(sync) = &config.sync else {
            return;
        };
        match Url::parse(&sync.webhook_url) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {
                if url.scheme() == "http" {
                    self.add_warning("sync.webhook_url", "webhook is not using https");
                }
            }
            Ok(_) => self.add_error("sync.webhook_url", "webhook must be an http or https URL"),
            Err(e) => self.add_error("sync.webhook_url", &format!("invalid URL: {e}")),
        }
        if let Some(timeout) = &sync.timeout {
            self.check_duration("sync.timeout", timeout, &SYNC_TIMEOUT_RANGE);
        }
    }

    fn check_duration(
        &mut self,
        path: &str,
        value: &DurationValue,
        range: &std::ops::RangeInclusive<u64>,
    ) {
        match value.as_secs() {
            Ok(secs) if range.contains(&secs) => {}
            Ok(secs) => self.add_error(
                path,
                &format!(
                    "{secs}s is out of range ({}-{}s)",
                    range.start(),
                    range.end()
                ),
            ),
            Err(e) => self.add_error(path, &format!("invalid duration: {e}")),
        }
    }

    fn add_error(&mut self, path: &str, message: &str) {
        self.errors.push(ValidationIssue {
            path: path.to_string(),
            message: message.to_string(),
            severity: Severity::Error,
        });
    }

    fn add_warning(&mut self, path: &str, message: &str) {
        self.warnings.push(ValidationIssue {
            path: path.to_string(),
            message: message.to_string(),
            severity: Severity::Warning,
        });
    }
}

const fn phase_key(phase: TimerPhase) -> &'static str {
    match phase {
        TimerPhase::Prep => "prep",
        TimerPhase::Positioning => "positioning",
        TimerPhase::Eccentric => "eccentric",
        TimerPhase::Concentric => "concentric",
        TimerPhase::FinalEccentric => "final_eccentric",
        TimerPhase::Complete => "complete",
        TimerPhase::Rest => "rest",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validate(yaml: &str) -> ValidationResult {
        let config: AppConfig = serde_yaml::from_str(yaml).unwrap();
        Validator::new().validate(&config)
    }

    #[test]
    fn defaults_are_valid() {
        let result = validate("{}");
        assert!(result.is_valid());
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn collects_every_error() {
        let result = validate(
            "profile:\n  default: 3\nphases:\n  prep: 0\n  eccentric: 601\n  rest: 31m\n",
        );
        let paths: Vec<&str> = result.errors.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(
            paths,
            ["profile.default", "phases.prep", "phases.eccentric", "phases.rest"]
        );
    }

    #[test]
    fn zero_rest_is_a_warning() {
        let result = validate("phases:\n  rest: 0\n");
        assert!(result.is_valid());
        assert_eq!(result.warnings[0].path, "phases.rest");
    }

    #[test]
    fn garbage_duration_is_reported() {
        let result = validate("phases:\n  concentric: soon\n");
        assert!(result.errors[0].message.starts_with("invalid duration"));
    }

    #[test]
    fn webhook_must_be_http() {
        let result = validate("sync:\n  webhook_url: ftp://example.com/x\n");
        assert_eq!(result.errors[0].path, "sync.webhook_url");

        let result = validate("sync:\n  webhook_url: http://example.com/x\n");
        assert!(result.is_valid());
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn unbalanced_command_rejected() {
        let result = validate("coach:\n  speech: \"say '{text}\"\n");
        assert_eq!(result.errors[0].path, "coach.speech");
    }
}
