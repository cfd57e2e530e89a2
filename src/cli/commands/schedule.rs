//! Schedule, phase durations and profile selection.

use chrono::Utc;

use crate::cli::args::{OutputFormat, PhasesArgs, ProfileArgs, ScheduleArgs};
use crate::cli::commands::{AppContext, print_json};
use crate::config::validation::{REST_RANGE, TIMED_PHASE_RANGE};
use crate::error::OneRepError;
use crate::model::{Profile, TimerPhase};
use crate::workout::next_workout;

/// # Errors
///
/// Returns an output failure.
pub fn schedule(args: &ScheduleArgs, ctx: &AppContext) -> Result<(), OneRepError> {
    let level = args.level.unwrap_or(ctx.config.profile.experience);
    let summary = ctx.log.summary(ctx.profile, Utc::now());
    let today = ctx.log.day_of(Utc::now());
    let last_date = summary.last_workout_date.map(|d| ctx.log.day_of(d));
    let next = next_workout(
        level,
        last_date,
        summary.last_workout_type.as_deref(),
        today,
    );

    match args.format {
        OutputFormat::Json => print_json(&next),
        OutputFormat::Human => {
            let when = match next.days_until {
                0 => "today".to_string(),
                1 => "tomorrow".to_string(),
                n => format!("in {n} days"),
            };
            println!(
                "Next: workout {} {when} ({}), {} per week",
                next.workout_type,
                next.date.format("%a %b %-d"),
                level.workouts_per_week()
            );
            Ok(())
        }
    }
}

/// Shows phase durations, or updates the ones given as flags.
///
/// # Errors
///
/// Out-of-range durations or a persistence failure.
pub fn phases(args: &PhasesArgs, ctx: &AppContext) -> Result<(), OneRepError> {
    let registry = ctx.registry();
    let mut settings = registry.phase_settings();

    let updates = [
        (TimerPhase::Prep, args.prep),
        (TimerPhase::Positioning, args.positioning),
        (TimerPhase::Eccentric, args.eccentric),
        (TimerPhase::Concentric, args.concentric),
        (TimerPhase::FinalEccentric, args.final_eccentric),
        (TimerPhase::Rest, args.rest),
    ];
    let mut changed = false;
    for (phase, value) in updates {
        let Some(seconds) = value else { continue };
        let range = if phase == TimerPhase::Rest {
            REST_RANGE
        } else {
            TIMED_PHASE_RANGE
        };
        if !range.contains(&u64::from(seconds)) {
            return Err(OneRepError::Usage(format!(
                "{} must be between {} and {} seconds",
                phase.label(),
                range.start(),
                range.end()
            )));
        }
        settings.set_duration(phase, seconds);
        changed = true;
    }
    if changed {
        registry.set_phase_settings(&settings)?;
    }

    for (phase, _) in updates {
        println!("{:<18} {:>4}s", phase.label(), settings.duration(phase));
    }
    println!("{:<18} {:>4}s", "Time under load", settings.working_time());
    Ok(())
}

/// Shows or switches the current profile.
///
/// # Errors
///
/// Invalid profile number or a persistence failure.
pub fn profile(args: &ProfileArgs, ctx: &AppContext) -> Result<(), OneRepError> {
    match args.number {
        None => println!("Profile {}", ctx.profile),
        Some(number) => {
            let profile = Profile::new(number)?;
            let mut registry = ctx.registry();
            registry.select_profile(profile)?;
            println!("Switched to profile {profile}");
        }
    }
    Ok(())
}
