//! `onerep log`: record a set without the timer.

use tracing::warn;

use crate::cli::args::LogArgs;
use crate::cli::commands::AppContext;
use crate::coach::SilentCoach;
use crate::error::OneRepError;
use crate::workout::SetDetails;

/// Logs one set, then mirrors it to the webhook and waits for delivery.
///
/// # Errors
///
/// Unknown exercise, invalid input, or a persistence failure.
pub async fn run(args: &LogArgs, ctx: AppContext) -> Result<(), OneRepError> {
    let sync = ctx.sync_client()?;
    let mut session = ctx
        .session(Box::new(SilentCoach))
        .with_workout_type(args.workout_type.clone());

    let id = session.registry().find_by_name(&args.exercise)?.id;
    let details = SetDetails {
        reps: args.reps,
        rpe: args.rpe,
        notes: args.notes.clone(),
    };
    let logged = session.log_set_for(id, args.weight, args.failure, details)?;

    let e = &logged.entry;
    let pr = if logged.is_personal_record { "  🏆 new PR!" } else { "" };
    let failure = if e.reached_failure { " to failure" } else { "" };
    println!("Logged {}: {}{failure}{pr}", e.exercise_name, e.weight);

    if let Some(sync) = sync {
        if let Err(err) = sync.send(e).await {
            warn!(error = %err, "webhook sync failed");
        }
    }
    Ok(())
}
