//! `onerep exercises`: edit the current workout.

use crate::cli::args::{ExercisesSubcommand, OutputFormat};
use crate::cli::commands::{AppContext, print_json};
use crate::error::OneRepError;
use crate::model::{Exercise, TimerPhase};

/// # Errors
///
/// Unknown exercise, invalid input, or a persistence failure.
pub fn run(cmd: ExercisesSubcommand, ctx: &AppContext) -> Result<(), OneRepError> {
    let mut registry = ctx.registry();
    match cmd {
        ExercisesSubcommand::List(args) => {
            if args.format == OutputFormat::Json {
                return print_json(registry.exercises());
            }
            println!("{} (profile {})", registry.workout().name, registry.profile());
            for (i, e) in registry.exercises().iter().enumerate() {
                let mark = if e.is_completed { "✓" } else { " " };
                let result = match (e.is_bodyweight, e.last_weight, e.last_duration) {
                    (true, _, Some(secs)) => format!("{secs}s"),
                    (_, Some(w), _) => w.to_string(),
                    _ => "-".to_string(),
                };
                let failure = if e.reached_failure { " F" } else { "" };
                let negative = if e.is_negative_only { " (negative)" } else { "" };
                println!("{mark} {:>2}. {:<22} {result}{failure}{negative}", i + 1, e.name);
            }
        }
        ExercisesSubcommand::Add {
            name,
            bodyweight,
            weight,
            negative,
        } => {
            let mut exercise = Exercise::custom(name, bodyweight);
            exercise.last_weight = weight;
            exercise.is_negative_only = negative;
            registry.add_exercise(exercise)?;
            println!("Added exercise #{}", registry.exercises().len());
        }
        ExercisesSubcommand::Remove { name } => {
            let id = registry.find_by_name(&name)?.id;
            let removed = registry.remove_exercise(id)?;
            println!("Removed {}", removed.name);
        }
        ExercisesSubcommand::Move { name, position } => {
            let id = registry.find_by_name(&name)?.id;
            let from = registry.workout().position(id).unwrap_or_default();
            let to = position.checked_sub(1).ok_or_else(|| {
                OneRepError::Usage("positions start at 1".to_string())
            })?;
            registry.move_exercise(from, to)?;
            println!("Moved {name} to position {position}");
        }
        ExercisesSubcommand::Weight { name, weight } => {
            if !weight.is_finite() || weight < 0.0 {
                return Err(OneRepError::Usage(format!("invalid weight {weight}")));
            }
            let id = registry.find_by_name(&name)?.id;
            registry.update_weight(id, weight)?;
            println!("{name}: {weight}");
        }
        ExercisesSubcommand::Negative { name, seconds, off } => {
            let id = registry.find_by_name(&name)?.id;
            if let Some(seconds) = seconds {
                let range = TimerPhase::Eccentric.duration_range();
                if !range.contains(&seconds) {
                    return Err(OneRepError::Usage(format!(
                        "eccentric must be between {} and {} seconds",
                        range.start(),
                        range.end()
                    )));
                }
                registry.update_duration(id, seconds)?;
            }
            registry.set_negative_only(id, !off)?;
            let state = if off { "off" } else { "on" };
            println!("{name}: negative-only {state}");
        }
        ExercisesSubcommand::Skip { name } => {
            let id = registry.find_by_name(&name)?.id;
            registry.skip_exercise(id)?;
            println!("Skipped {name}");
        }
    }
    Ok(())
}
