//! CLI command dispatch and handlers.
//!
//! Routes parsed CLI arguments to the appropriate command handler.

pub mod completions;
pub mod config;
pub mod exercises;
pub mod history;
pub mod log;
pub mod run;
pub mod schedule;
pub mod template;
pub mod version;
pub mod workout;

use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use chrono::NaiveDate;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::cli::args::{Cli, Commands, ConfigSubcommand};
use crate::coach::{CommandSpeaker, CueSink, SilentCoach, VoiceCoach, speaker};
use crate::config::{AppConfig, ConfigLoader};
use crate::error::{ConfigError, ExitCode, OneRepError};
use crate::model::Profile;
use crate::observability::{EventEmitter, FinishReason};
use crate::store::{self, ExerciseRegistry, LogStore, SharedStore, TemplateStore, keys};
use crate::sync::{DEFAULT_TIMEOUT, SyncClient};
use crate::workout::WorkoutSession;

/// Data directory name under `$HOME`.
const DEFAULT_DIR_NAME: &str = ".onerep";

// ============================================================================
// Shutdown
// ============================================================================

/// Shared shutdown signal; the first reason recorded wins.
#[derive(Debug, Clone, Default)]
pub struct Shutdown {
    token: CancellationToken,
    reason: Arc<OnceLock<FinishReason>>,
}

impl Shutdown {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trigger(&self, reason: FinishReason) {
        let _ = self.reason.set(reason);
        self.token.cancel();
    }

    #[must_use]
    pub const fn token(&self) -> &CancellationToken {
        &self.token
    }

    #[must_use]
    pub fn reason(&self) -> Option<FinishReason> {
        self.reason.get().copied()
    }

    /// Exit code for a signal-triggered shutdown.
    #[must_use]
    pub fn exit_code(&self) -> Option<i32> {
        match self.reason()? {
            FinishReason::Interrupted => Some(ExitCode::INTERRUPTED),
            FinishReason::Terminated => Some(ExitCode::TERMINATED),
            FinishReason::Completed | FinishReason::Finished => None,
        }
    }
}

// ============================================================================
// Context
// ============================================================================

/// Everything a command needs, resolved from flags, configuration and
/// the data directory.
#[derive(Debug)]
pub struct AppContext {
    pub config: Arc<AppConfig>,
    pub data_dir: PathBuf,
    pub store: SharedStore,
    pub log: LogStore,
    pub profile: Profile,
    pub events: Arc<EventEmitter>,
}

impl AppContext {
    /// Opens the stores for a parsed command line.
    ///
    /// # Errors
    ///
    /// Configuration failures, an invalid profile, or an unwritable
    /// events file.
    pub fn open(cli: &Cli) -> Result<Self, OneRepError> {
        let loaded = ConfigLoader::default().load_optional(cli.config.as_deref())?;
        let config = loaded.config;

        let data_dir = resolve_data_dir(cli.data_dir.as_deref(), &config);
        debug!(dir = %data_dir.display(), "opening data directory");
        let (store, log) = store::open_data_dir(&data_dir);

        let requested = cli.profile.or_else(|| {
            store
                .get(keys::CURRENT_PROFILE)
                .is_none()
                .then_some(config.profile.default)
                .flatten()
        });
        let profile = match requested {
            Some(n) => Profile::new(n)?,
            None => ExerciseRegistry::current_profile(&store),
        };

        let events = match &cli.events_file {
            Some(path) => EventEmitter::from_file(path)?,
            None => EventEmitter::noop(),
        };

        Ok(Self {
            config,
            data_dir,
            store,
            log,
            profile,
            events: Arc::new(events),
        })
    }

    #[must_use]
    pub fn registry(&self) -> ExerciseRegistry {
        ExerciseRegistry::load(self.store.clone(), self.profile)
    }

    #[must_use]
    pub fn templates(&self) -> TemplateStore {
        TemplateStore::new(self.store.clone())
    }

    /// Webhook client, if one is configured.
    ///
    /// # Errors
    ///
    /// Returns an invalid URL or timeout.
    pub fn sync_client(&self) -> Result<Option<SyncClient>, ConfigError> {
        let Some(sync) = &self.config.sync else {
            return Ok(None);
        };
        let timeout = match &sync.timeout {
            Some(t) => std::time::Duration::from_secs(t.as_secs().map_err(|e| {
                ConfigError::InvalidValue {
                    field: "sync.timeout".to_string(),
                    value: format!("{t:?}"),
                    expected: e,
                }
            })?),
            None => DEFAULT_TIMEOUT,
        };
        SyncClient::new(&sync.webhook_url, timeout).map(Some)
    }

    /// Coach built from the `coach` section.
    ///
    /// # Errors
    ///
    /// Returns a malformed player or speech command.
    pub fn coach(&self, silent: bool) -> Result<Box<dyn CueSink>, ConfigError> {
        let coach = &self.config.coach;
        if silent || !coach.enabled {
            return Ok(Box::new(SilentCoach));
        }
        let player = coach
            .player
            .as_deref()
            .map(|c| speaker::parse_command("coach.player", c))
            .transpose()?;
        let speech = coach
            .speech
            .as_deref()
            .map(|c| speaker::parse_command("coach.speech", c))
            .transpose()?;
        let asset_dir = coach
            .asset_dir
            .clone()
            .unwrap_or_else(|| self.data_dir.join("audio"));
        Ok(Box::new(VoiceCoach::new(
            coach.voice,
            asset_dir,
            Box::new(CommandSpeaker::new(player, speech)),
        )))
    }

    /// A session over this context's stores.
    #[must_use]
    pub fn session(self, coach: Box<dyn CueSink>) -> WorkoutSession {
        let registry = self.registry();
        let templates = self.templates();
        WorkoutSession::new(registry, self.log, templates, coach, self.events)
    }
}

fn resolve_data_dir(flag: Option<&Path>, config: &AppConfig) -> PathBuf {
    if let Some(dir) = flag.or(config.storage.data_dir.as_deref()) {
        return dir.to_path_buf();
    }
    std::env::var_os("HOME").map_or_else(
        || PathBuf::from(DEFAULT_DIR_NAME),
        |home| PathBuf::from(home).join(DEFAULT_DIR_NAME),
    )
}

/// Parses a `YYYY-MM-DD` argument.
///
/// # Errors
///
/// Returns [`OneRepError::Usage`] for anything else.
pub fn parse_day(raw: &str) -> Result<NaiveDate, OneRepError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| OneRepError::Usage(format!("invalid date '{raw}', expected YYYY-MM-DD")))
}

/// Prints `value` as pretty JSON on stdout.
///
/// # Errors
///
/// Returns an encoding failure.
pub fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<(), OneRepError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

// ============================================================================
// Dispatch
// ============================================================================

/// Dispatch a parsed CLI invocation to the appropriate command handler.
///
/// # Errors
///
/// Returns an error if the dispatched command handler fails.
pub async fn dispatch(cli: Cli, shutdown: Shutdown) -> Result<(), OneRepError> {
    match &cli.command {
        Commands::Completions(args) => {
            completions::run(args);
            return Ok(());
        }
        Commands::Version(args) => {
            version::run(args)?;
            return Ok(());
        }
        Commands::Config(cmd) => {
            if let ConfigSubcommand::Validate {
                files,
                format,
                strict,
            } = &cmd.subcommand
            {
                return config::validate(files, *format, *strict);
            }
        }
        _ => {}
    }

    let ctx = AppContext::open(&cli)?;
    match cli.command {
        Commands::Run(args) => run::run(&args, ctx, shutdown).await,
        Commands::Log(args) => log::run(&args, ctx).await,
        Commands::History(args) => history::history(&args, ctx),
        Commands::Stats(args) => history::stats(&args, &ctx),
        Commands::Prs(args) => history::prs(&args, &ctx),
        Commands::Export(args) => history::export(&args, &ctx),
        Commands::Exercises(cmd) => exercises::run(cmd.subcommand, &ctx),
        Commands::Workout(cmd) => workout::run(cmd.subcommand, ctx),
        Commands::Template(cmd) => template::run(cmd.subcommand, ctx),
        Commands::Schedule(args) => schedule::schedule(&args, &ctx),
        Commands::Phases(args) => schedule::phases(&args, &ctx),
        Commands::Profile(args) => schedule::profile(&args, &ctx),
        Commands::Config(_) => config::show(&ctx),
        Commands::Completions(_) | Commands::Version(_) => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shutdown_keeps_first_reason() {
        let shutdown = Shutdown::new();
        assert_eq!(shutdown.exit_code(), None);
        shutdown.trigger(FinishReason::Terminated);
        shutdown.trigger(FinishReason::Interrupted);
        assert!(shutdown.token().is_cancelled());
        assert_eq!(shutdown.exit_code(), Some(ExitCode::TERMINATED));
    }

    #[test]
    fn parse_day_formats() {
        assert_eq!(
            parse_day("2026-03-01").unwrap(),
            NaiveDate::from_ymd_opt(2026, 3, 1).unwrap()
        );
        assert!(matches!(parse_day("03/01/2026"), Err(OneRepError::Usage(_))));
    }

    #[test]
    fn data_dir_flag_wins() {
        let mut config = AppConfig::default();
        config.storage.data_dir = Some(PathBuf::from("/from/config"));
        assert_eq!(
            resolve_data_dir(Some(Path::new("/from/flag")), &config),
            PathBuf::from("/from/flag")
        );
        assert_eq!(resolve_data_dir(None, &config), PathBuf::from("/from/config"));
    }
}
