//! `onerep workout`: finish, reset, repeat.

use crate::cli::args::WorkoutSubcommand;
use crate::cli::commands::{AppContext, parse_day};
use crate::coach::SilentCoach;
use crate::error::OneRepError;
use crate::store::templates::{recent_workout_days, suggested_name};

/// # Errors
///
/// Invalid date or a persistence failure.
pub fn run(cmd: WorkoutSubcommand, ctx: AppContext) -> Result<(), OneRepError> {
    if let WorkoutSubcommand::Recent { limit } = cmd {
        let days = recent_workout_days(&ctx.log, ctx.profile, limit);
        if days.is_empty() {
            println!("No workouts logged yet.");
        }
        for (day, entries) in days {
            let names: Vec<&str> = entries.iter().map(|e| e.exercise_name.as_str()).collect();
            println!("{day}  {}  ({})", suggested_name(day), names.join(", "));
        }
        return Ok(());
    }

    let mut session = ctx.session(Box::new(SilentCoach));
    match cmd {
        WorkoutSubcommand::Finish => {
            let logged = session.log_all_completed()?;
            session.finish_workout()?;
            println!("Workout finished ({} set(s) logged).", logged.len());
        }
        WorkoutSubcommand::Reset => {
            session.reset_workout()?;
            println!("Workout reset to defaults.");
        }
        WorkoutSubcommand::Repeat { date } => {
            let day = parse_day(&date)?;
            match session.repeat_day(day)? {
                0 => println!("No sets logged on {day}."),
                n => println!("Loaded {n} exercise(s) from {day}."),
            }
        }
        WorkoutSubcommand::Recent { .. } => {}
    }
    Ok(())
}
