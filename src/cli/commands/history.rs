//! History, statistics, records and CSV export.

use std::collections::BTreeMap;

use chrono::Utc;
use serde::Serialize;

use crate::cli::args::{ExportArgs, FormatArgs, HistoryArgs, OutputFormat};
use crate::cli::commands::{AppContext, print_json};
use crate::error::{OneRepError, RegistryError};
use crate::model::WorkoutLogEntry;
use crate::store::WidgetSummary;
use crate::store::registry::suggest_name;

/// Lists logged sets, or deletes them all with `--clear --yes`.
///
/// # Errors
///
/// Unknown exercise (with a suggestion), a write or an output failure.
pub fn history(args: &HistoryArgs, mut ctx: AppContext) -> Result<(), OneRepError> {
    if args.clear {
        let removed = ctx.log.clear_profile(ctx.profile)?;
        println!("Deleted {removed} set(s) from profile {}.", ctx.profile);
        return Ok(());
    }

    let entries: Vec<&WorkoutLogEntry> = match &args.exercise {
        Some(name) => {
            let names = ctx.log.unique_exercises(ctx.profile);
            let Some(canonical) = names.iter().find(|n| n.eq_ignore_ascii_case(name.trim())) else {
                return Err(RegistryError::UnknownExercise {
                    name: name.clone(),
                    suggestion: suggest_name(name, names.iter().map(String::as_str)),
                }
                .into());
            };
            ctx.log
                .entries_for_profile(ctx.profile)
                .filter(|e| e.exercise_name == *canonical)
                .take(args.limit)
                .collect()
        }
        None => ctx.log.recent(ctx.profile, args.limit),
    };

    match args.format {
        OutputFormat::Json => print_json(&entries),
        OutputFormat::Human => {
            if entries.is_empty() {
                println!("No sets logged for profile {}.", ctx.profile);
                return Ok(());
            }
            for e in entries {
                let date = e.date.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M");
                let failure = if e.reached_failure { "F" } else { " " };
                let rpe = e.rpe.map(|r| format!(" RPE {r}")).unwrap_or_default();
                let notes = e.notes.as_deref().map(|n| format!("  {n}")).unwrap_or_default();
                println!("{date}  {:<20} {:>7} {failure}{rpe}{notes}", e.exercise_name, e.weight);
            }
            Ok(())
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ExerciseStats {
    sets: usize,
    max_weight: Option<f64>,
    last_weight: Option<f64>,
    failure_rate: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    average_rpe: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    estimated_1rm: Option<f64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StatsReport {
    #[serde(flatten)]
    summary: WidgetSummary,
    total_sets: usize,
    sets_today: usize,
    exercises: BTreeMap<String, ExerciseStats>,
}

/// # Errors
///
/// Returns an output failure.
pub fn stats(args: &FormatArgs, ctx: &AppContext) -> Result<(), OneRepError> {
    let now = Utc::now();
    let log = &ctx.log;
    let profile = ctx.profile;

    let exercises = log
        .unique_exercises(profile)
        .into_iter()
        .map(|name| {
            let stats = ExerciseStats {
                sets: log.entries_for_exercise(&name, profile).count(),
                max_weight: log.max_weight(&name, profile),
                last_weight: log.last_weight(&name, profile),
                failure_rate: log.failure_rate(&name, profile),
                average_rpe: log.average_rpe(&name, profile),
                estimated_1rm: log.estimated_1rm(&name, profile),
            };
            (name, stats)
        })
        .collect();

    let report = StatsReport {
        summary: log.summary(profile, now),
        total_sets: log.total_sets(profile),
        sets_today: log.sets_on(profile, log.day_of(now)),
        exercises,
    };

    match args.format {
        OutputFormat::Json => print_json(&report),
        OutputFormat::Human => {
            let s = &report.summary;
            println!("Profile {profile}");
            println!("  streak          {} day(s)", s.streak);
            println!("  workouts        {} total, {} this week", s.total_workouts, s.weekly_workouts);
            println!("  sets            {} total, {} today", report.total_sets, report.sets_today);
            println!("  7-day volume    {}", s.total_volume);
            for (name, e) in &report.exercises {
                let max = e.max_weight.map(|w| w.to_string()).unwrap_or_else(|| "-".into());
                let one_rm = e
                    .estimated_1rm
                    .map(|v| format!("  1RM≈{v:.1}"))
                    .unwrap_or_default();
                println!(
                    "  {name:<20} {} sets  max {max}  failure {:.0}%{one_rm}",
                    e.sets, e.failure_rate
                );
            }
            Ok(())
        }
    }
}

/// # Errors
///
/// Returns an output failure.
pub fn prs(args: &FormatArgs, ctx: &AppContext) -> Result<(), OneRepError> {
    let records = ctx.log.personal_records(ctx.profile);
    match args.format {
        OutputFormat::Json => print_json(&records),
        OutputFormat::Human => {
            if records.is_empty() {
                println!("No records yet.");
            }
            for (name, weight) in &records {
                println!("{name:<24} {weight}");
            }
            Ok(())
        }
    }
}

/// # Errors
///
/// Returns a write failure.
pub fn export(args: &ExportArgs, ctx: &AppContext) -> Result<(), OneRepError> {
    let csv = ctx.log.export_csv(ctx.profile);
    match &args.output {
        Some(path) => {
            std::fs::write(path, csv)?;
            println!("Exported to {}", path.display());
        }
        None => print!("{csv}"),
    }
    Ok(())
}
