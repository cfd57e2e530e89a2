//! Configuration loader.
//!
//! Pipeline:
//! 1. Size check and UTF-8 BOM strip
//! 2. Environment variable expansion on the raw text
//! 3. YAML parsing
//! 4. Validation (all issues collected)
//! 5. Freeze with `Arc`

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::config::schema::AppConfig;
use crate::config::validation::Validator;
use crate::error::{ConfigError, ValidationIssue};

/// Environment variable naming the configuration file.
pub const CONFIG_ENV: &str = "ONEREP_CONFIG";

/// Limits applied before parsing.
#[derive(Debug, Clone)]
pub struct ConfigLimits {
    /// Maximum configuration file size in bytes.
    pub max_config_size: usize,
}

impl Default for ConfigLimits {
    fn default() -> Self {
        Self {
            max_config_size: env_or("ONEREP_MAX_CONFIG_SIZE", 1024 * 1024),
        }
    }
}

/// A loaded, validated configuration.
#[derive(Debug)]
pub struct LoadResult {
    pub config: Arc<AppConfig>,
    pub warnings: Vec<ValidationIssue>,
}

/// Loads `onerep.yaml` files.
#[derive(Debug, Default)]
pub struct ConfigLoader {
    limits: ConfigLimits,
}

impl ConfigLoader {
    #[must_use]
    pub const fn new(limits: ConfigLimits) -> Self {
        Self { limits }
    }

    /// Loads the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file is missing, unreadable or too large
    /// - A referenced environment variable is unset
    /// - YAML parsing fails
    /// - Validation finds errors
    pub fn load(&self, path: &Path) -> Result<LoadResult, ConfigError> {
        let metadata = std::fs::metadata(path).map_err(|_| ConfigError::MissingFile {
            path: path.to_path_buf(),
        })?;
        let file_size = usize::try_from(metadata.len()).unwrap_or(usize::MAX);
        if file_size > self.limits.max_config_size {
            return Err(ConfigError::InvalidValue {
                field: "file_size".to_string(),
                value: format!("{file_size} bytes"),
                expected: format!("at most {} bytes", self.limits.max_config_size),
            });
        }

        let raw = std::fs::read_to_string(path).map_err(|_| ConfigError::MissingFile {
            path: path.to_path_buf(),
        })?;
        debug!(path = %path.display(), bytes = raw.len(), "loading configuration");
        self.load_from_str(&raw, path)
    }

    /// Loads configuration text; `source` is used in error messages only.
    ///
    /// # Errors
    ///
    /// See [`Self::load`].
    pub fn load_from_str(&self, raw: &str, source: &Path) -> Result<LoadResult, ConfigError> {
        let raw = raw.strip_prefix('\u{feff}').unwrap_or(raw);
        let expanded = expand_env(raw)?;

        let config: AppConfig = if expanded.trim().is_empty() {
            AppConfig::default()
        } else {
            serde_yaml::from_str(&expanded).map_err(|e| ConfigError::ParseError {
                path: source.to_path_buf(),
                line: e.location().map(|l| l.line()),
                message: e.to_string(),
            })?
        };

        let result = Validator::new().validate(&config);
        if result.has_errors() {
            return Err(ConfigError::ValidationError {
                path: source.display().to_string(),
                errors: result.errors,
            });
        }
        for w in &result.warnings {
            warn!(path = %w.path, "{}", w.message);
        }

        Ok(LoadResult {
            config: Arc::new(config),
            warnings: result.warnings,
        })
    }

    /// Loads the explicit path if given, else `ONEREP_CONFIG`, else the
    /// defaults.
    ///
    /// # Errors
    ///
    /// See [`Self::load`].
    pub fn load_optional(&self, explicit: Option<&Path>) -> Result<LoadResult, ConfigError> {
        let path = explicit
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from));
        match path {
            Some(path) => self.load(&path),
            None => {
                debug!("no configuration file, using defaults");
                Ok(LoadResult {
                    config: Arc::new(AppConfig::default()),
                    warnings: Vec::new(),
                })
            }
        }
    }
}

// ============================================================================
// Environment expansion
// ============================================================================

/// Expands `${VAR}` and `${VAR:-default}`; `$$` is a literal `$`.
///
/// # Errors
///
/// [`ConfigError::EnvVarNotSet`] for an unset variable without default,
/// [`ConfigError::ParseError`] for an unclosed reference.
pub fn expand_env(raw: &str) -> Result<String, ConfigError> {
    let mut out = String::with_capacity(raw.len());
    let mut line = 1usize;
    let mut chars = raw.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '\n' {
            line += 1;
        }
        if c != '$' {
            out.push(c);
            continue;
        }
        match chars.peek() {
            Some('$') => {
                chars.next();
                out.push('$');
            }
            Some('{') => {
                chars.next();
                let mut spec = String::new();
                let mut closed = false;
                for c in chars.by_ref() {
                    if c == '}' {
                        closed = true;
                        break;
                    }
                    spec.push(c);
                }
                if !closed {
                    return Err(ConfigError::ParseError {
                        path: PathBuf::new(),
                        line: Some(line),
                        message: format!("unclosed environment variable reference: ${{{spec}"),
                    });
                }
                let (name, default) = match spec.split_once(":-") {
                    Some((name, default)) => (name, Some(default)),
                    None => (spec.as_str(), None),
                };
                match (std::env::var(name), default) {
                    (Ok(value), _) => out.push_str(&value),
                    (Err(_), Some(default)) => out.push_str(default),
                    (Err(_), None) => {
                        return Err(ConfigError::EnvVarNotSet {
                            var: name.to_string(),
                            line,
                        });
                    }
                }
            }
            _ => out.push('$'),
        }
    }
    Ok(out)
}

fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn expands_defaults_and_escapes() {
        let out = expand_env("a: ${ONEREP_TEST_SURELY_UNSET:-42}\nb: $$5\nc: $x\n").unwrap();
        assert_eq!(out, "a: 42\nb: $5\nc: $x\n");
    }

    #[test]
    fn expands_set_variable() {
        // PATH is set in every test environment.
        let path = std::env::var("PATH").unwrap();
        assert_eq!(expand_env("${PATH}").unwrap(), path);
    }

    #[test]
    fn unset_variable_reports_line() {
        let err = expand_env("a: 1\nb: ${ONEREP_TEST_SURELY_UNSET}\n").unwrap_err();
        assert!(matches!(err, ConfigError::EnvVarNotSet { line: 2, .. }));
    }

    #[test]
    fn unclosed_reference_is_parse_error() {
        assert!(matches!(
            expand_env("a: ${OOPS"),
            Err(ConfigError::ParseError { .. })
        ));
    }

    #[test]
    fn bom_and_empty_file_give_defaults() {
        let result = ConfigLoader::default()
            .load_from_str("\u{feff}", Path::new("mem.yaml"))
            .unwrap();
        assert_eq!(*result.config, AppConfig::default());
    }

    #[test]
    fn parse_error_carries_line() {
        let err = ConfigLoader::default()
            .load_from_str("phases:\n  rest: [\n", Path::new("bad.yaml"))
            .unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { line: Some(_), .. }));
    }

    #[test]
    fn validation_errors_block_loading() {
        let err = ConfigLoader::default()
            .load_from_str("profile:\n  default: 9\n", Path::new("x.yaml"))
            .unwrap_err();
        let ConfigError::ValidationError { errors, .. } = err else {
            panic!("expected validation error");
        };
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn size_limit_enforced() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"phases:\n  rest: 60\n").unwrap();
        let loader = ConfigLoader::new(ConfigLimits { max_config_size: 4 });
        assert!(matches!(
            loader.load(file.path()),
            Err(ConfigError::InvalidValue { .. })
        ));
        let loaded = ConfigLoader::default().load(file.path()).unwrap();
        assert_eq!(loaded.config.phases.rest.as_ref().unwrap().as_secs(), Ok(60));
    }

    #[test]
    fn missing_file() {
        let err = ConfigLoader::default()
            .load(Path::new("/definitely/not/here.yaml"))
            .unwrap_err();
        assert!(matches!(err, ConfigError::MissingFile { .. }));
    }
}
