//! CLI argument definitions.
//!
//! All Clap derive structs for `onerep` command-line parsing.

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};

use crate::observability::LogFormat;
use crate::workout::ExperienceLevel;

// ============================================================================
// Root CLI
// ============================================================================

/// High-intensity strength training timer and log.
#[derive(Parser, Debug)]
#[command(name = "onerep", author, version, about)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all non-error output.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output control.
    #[arg(long, default_value = "auto", global = true, env = "ONEREP_COLOR")]
    pub color: ColorChoice,

    /// Log line format.
    #[arg(long, default_value = "human", global = true)]
    pub log_format: LogFormat,

    /// Path to a YAML configuration file.
    #[arg(short, long, global = true, env = "ONEREP_CONFIG")]
    pub config: Option<PathBuf>,

    /// Directory holding settings and logs.
    #[arg(long, global = true, env = "ONEREP_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Profile to act on (1 or 2); defaults to the last selected.
    #[arg(short, long, global = true)]
    pub profile: Option<u8>,

    /// Write the JSONL session event stream to this file.
    #[arg(long, global = true)]
    pub events_file: Option<PathBuf>,

    /// Serve Prometheus metrics on 127.0.0.1:<port>.
    #[arg(long, global = true, env = "ONEREP_METRICS_PORT")]
    pub metrics_port: Option<u16>,
}

// ============================================================================
// Top-Level Commands
// ============================================================================

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the interactive phase timer.
    Run(RunArgs),

    /// Log a set without running the timer.
    Log(LogArgs),

    /// Show logged sets, newest first.
    History(HistoryArgs),

    /// Show streak, volume and per-exercise statistics.
    Stats(FormatArgs),

    /// Show the heaviest weight per exercise.
    Prs(FormatArgs),

    /// Export the log as CSV.
    Export(ExportArgs),

    /// Manage the exercises of the current workout.
    Exercises(ExercisesCommand),

    /// Finish, reset or repeat a workout.
    Workout(WorkoutCommand),

    /// Manage saved workout templates.
    Template(TemplateCommand),

    /// Plan the next workout.
    Schedule(ScheduleArgs),

    /// Show or change phase durations.
    Phases(PhasesArgs),

    /// Show or select the current profile.
    Profile(ProfileArgs),

    /// Inspect configuration files.
    Config(ConfigCommand),

    /// Generate shell completion scripts.
    Completions(CompletionsArgs),

    /// Display version information.
    Version(FormatArgs),
}

// ============================================================================
// Timer and logging
// ============================================================================

#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Exercise to start with; defaults to the first incomplete one.
    #[arg(short, long)]
    pub exercise: Option<String>,

    /// Routine tag written to the log ("A", "B").
    #[arg(long, default_value = "workout")]
    pub workout_type: String,

    /// Disable audio coaching.
    #[arg(long)]
    pub silent: bool,
}

#[derive(Args, Debug)]
pub struct LogArgs {
    /// Exercise name.
    pub exercise: String,

    /// Weight moved.
    pub weight: f64,

    /// The set reached muscular failure.
    #[arg(short, long)]
    pub failure: bool,

    #[arg(long)]
    pub reps: Option<u32>,

    /// Rate of perceived exertion (1-10).
    #[arg(long)]
    pub rpe: Option<u8>,

    #[arg(long)]
    pub notes: Option<String>,

    /// Routine tag written to the log.
    #[arg(long, default_value = "workout")]
    pub workout_type: String,
}

#[derive(Args, Debug)]
pub struct HistoryArgs {
    /// Only show this exercise.
    #[arg(short, long)]
    pub exercise: Option<String>,

    /// Maximum number of sets to show.
    #[arg(short = 'n', long, default_value_t = 20)]
    pub limit: usize,

    #[arg(short, long, default_value = "human")]
    pub format: OutputFormat,

    /// Delete every logged set of the current profile.
    #[arg(long, requires = "yes", conflicts_with = "exercise")]
    pub clear: bool,

    /// Confirm `--clear`.
    #[arg(long)]
    pub yes: bool,
}

#[derive(Args, Debug, Default)]
pub struct FormatArgs {
    #[arg(short, long, default_value = "human")]
    pub format: OutputFormat,
}

#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Write to this file instead of stdout.
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

// ============================================================================
// Exercises
// ============================================================================

#[derive(Args, Debug)]
pub struct ExercisesCommand {
    #[command(subcommand)]
    pub subcommand: ExercisesSubcommand,
}

#[derive(Subcommand, Debug)]
pub enum ExercisesSubcommand {
    /// List exercises with their last result.
    List(FormatArgs),

    /// Append a custom exercise.
    Add {
        name: String,
        /// Track hold time instead of weight.
        #[arg(long)]
        bodyweight: bool,
        /// Starting weight.
        #[arg(long)]
        weight: Option<f64>,
        /// Lowering only: the set ends after the eccentric.
        #[arg(long)]
        negative: bool,
    },

    /// Remove an exercise.
    Remove { name: String },

    /// Move an exercise to a 1-based position.
    Move { name: String, position: usize },

    /// Set the working weight.
    Weight { name: String, weight: f64 },

    /// Mark an exercise done without logging it.
    Skip { name: String },

    /// Turn negative-only mode on, optionally with the eccentric length.
    Negative {
        name: String,
        /// Eccentric seconds for this exercise.
        #[arg(long)]
        seconds: Option<u32>,
        /// Turn negative-only mode off.
        #[arg(long, conflicts_with = "seconds")]
        off: bool,
    },
}

// ============================================================================
// Workout
// ============================================================================

#[derive(Args, Debug)]
pub struct WorkoutCommand {
    #[command(subcommand)]
    pub subcommand: WorkoutSubcommand,
}

#[derive(Subcommand, Debug)]
pub enum WorkoutSubcommand {
    /// Log completed sets and clear checkmarks, keeping weights.
    Finish,

    /// Drop all results and restore the built-in workout.
    Reset,

    /// Rebuild the workout from the sets logged on a day (YYYY-MM-DD).
    Repeat { date: String },

    /// Show workouts grouped by day.
    Recent {
        #[arg(short = 'n', long, default_value_t = 7)]
        limit: usize,
    },
}

// ============================================================================
// Templates
// ============================================================================

#[derive(Args, Debug)]
pub struct TemplateCommand {
    #[command(subcommand)]
    pub subcommand: TemplateSubcommand,
}

#[derive(Subcommand, Debug)]
pub enum TemplateSubcommand {
    /// List recent and saved templates.
    List(FormatArgs),

    /// Save the current workout as a template.
    Save {
        /// Template name; defaults to "Workout - <date>".
        name: Option<String>,
        /// Build from the sets logged on this day (YYYY-MM-DD) instead.
        #[arg(long)]
        from_day: Option<String>,
    },

    /// Replace the current workout with a template.
    Load { name: String },

    Delete { name: String },

    Rename { name: String, new_name: String },

    /// Print a template as shareable JSON.
    Export {
        name: String,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Import a shared template from a JSON file.
    Import { file: PathBuf },
}

// ============================================================================
// Planning and settings
// ============================================================================

#[derive(Args, Debug)]
pub struct ScheduleArgs {
    /// Experience level; defaults to the configured one.
    #[arg(short, long)]
    pub level: Option<ExperienceLevel>,

    #[arg(short, long, default_value = "human")]
    pub format: OutputFormat,
}

#[derive(Args, Debug, Default)]
pub struct PhasesArgs {
    #[arg(long)]
    pub prep: Option<u32>,
    #[arg(long)]
    pub positioning: Option<u32>,
    #[arg(long)]
    pub eccentric: Option<u32>,
    #[arg(long)]
    pub concentric: Option<u32>,
    #[arg(long)]
    pub final_eccentric: Option<u32>,
    #[arg(long)]
    pub rest: Option<u32>,
}

#[derive(Args, Debug)]
pub struct ProfileArgs {
    /// Profile to select.
    pub number: Option<u8>,
}

#[derive(Args, Debug)]
pub struct ConfigCommand {
    #[command(subcommand)]
    pub subcommand: ConfigSubcommand,
}

#[derive(Subcommand, Debug)]
pub enum ConfigSubcommand {
    /// Validate configuration files.
    Validate {
        #[arg(required = true)]
        files: Vec<PathBuf>,

        #[arg(short, long, default_value = "human")]
        format: OutputFormat,

        /// Treat warnings as errors.
        #[arg(long)]
        strict: bool,
    },

    /// Print the effective configuration as YAML.
    Show,
}

// ============================================================================
// Completions
// ============================================================================

#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Target shell for completion script.
    pub shell: Shell,
}

// ============================================================================
// CLI-Local Enums
// ============================================================================

/// Color output choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ColorChoice {
    /// Auto-detect terminal support.
    #[default]
    Auto,
    Always,
    Never,
}

/// Output format for structured output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Human,
    Json,
}

/// Shell type for completion generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    /// `PowerShell`.
    #[value(name = "powershell")]
    PowerShell,
    Elvish,
}

// ============================================================================
// Tests
// ============================================================================
