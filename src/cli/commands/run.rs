//! Interactive timer.
//!
//! Ticks come from a [`Ticker`]; commands are read line by line from
//! stdin:
//!
//! | input        | action                               |
//! |--------------|--------------------------------------|
//! | `p`          | pause / resume                       |
//! | `s`          | skip phase (skips rest during rest)  |
//! | `r`          | reset the current phase              |
//! | `a`          | another set of the same exercise     |
//! | `n NAME`     | switch to another exercise           |
//! | `l W [f]`    | log weight `W`, `f` for failure      |
//! | `q`          | stop without finishing               |

use std::io::Write;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::cli::args::RunArgs;
use crate::cli::commands::{AppContext, Shutdown};
use crate::error::OneRepError;
use crate::model::TimerPhase;
use crate::observability::FinishReason;
use crate::phase::ticker::TICK_PERIOD;
use crate::phase::{Tick, Ticker};
use crate::workout::{SessionStep, SetDetails, WorkoutSession};

/// A parsed stdin command.
#[derive(Debug, Clone, PartialEq)]
pub enum Input {
    Toggle,
    Skip,
    Reset,
    AnotherSet,
    Switch(String),
    Log { weight: f64, failure: bool },
    Quit,
    Help,
}

impl Input {
    /// Parses one line; `None` for blank or unrecognized input.
    #[must_use]
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        let (head, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let rest = rest.trim();
        match head.to_ascii_lowercase().as_str() {
            "p" | "pause" => Some(Self::Toggle),
            "s" | "skip" => Some(Self::Skip),
            "r" | "reset" => Some(Self::Reset),
            "a" | "again" => Some(Self::AnotherSet),
            "q" | "quit" => Some(Self::Quit),
            "h" | "?" | "help" => Some(Self::Help),
            "n" | "next" if !rest.is_empty() => Some(Self::Switch(rest.to_string())),
            "l" | "log" => {
                let mut parts = rest.split_whitespace();
                let weight = parts.next()?.parse().ok()?;
                let failure = matches!(parts.next(), Some("f" | "failure"));
                Some(Self::Log { weight, failure })
            }
            _ => None,
        }
    }
}

const HELP: &str = "p pause/resume · s skip · r reset phase · a another set · n NAME switch · l WEIGHT [f] log · q quit";

/// Runs the interactive timer until the workout ends, stdin closes, `q`,
/// or a signal.
///
/// # Errors
///
/// Unknown exercise, configuration or persistence failures.
pub async fn run(args: &RunArgs, ctx: AppContext, shutdown: Shutdown) -> Result<(), OneRepError> {
    let coach = ctx.coach(args.silent)?;
    let sync = ctx.sync_client()?;
    let phases = ctx.config.phases.clone();
    let mut session = ctx.session(coach).with_workout_type(args.workout_type.clone());
    if let Some(sync) = sync {
        session = session.with_sync(sync);
    }
    if !phases.is_empty() {
        let settings = phases.apply(session.registry().phase_settings());
        session.registry().set_phase_settings(&settings)?;
    }

    let first = match &args.exercise {
        Some(name) => session.registry().find_by_name(name)?.id,
        None => match session.registry().next_incomplete(None) {
            Some(e) => e.id,
            None => {
                println!("Every exercise is already complete. Run `onerep workout finish` to start over.");
                return Ok(());
            }
        },
    };

    let (tx, mut rx) = mpsc::unbounded_channel::<Tick>();
    let mut ticker = Ticker::new(TICK_PERIOD, tx, shutdown.token().clone());
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("{HELP}");
    let step = session.start_exercise(first)?;
    let mut done = render(&session, &step);
    sync_ticker(&session, &mut ticker, &mut rx);

    while !done {
        tokio::select! {
            () = shutdown.token().cancelled() => {
                let reason = shutdown.reason().unwrap_or(FinishReason::Interrupted);
                session.interrupt(reason);
                println!();
                break;
            }
            Some(Tick) = rx.recv() => match session.tick() {
                Ok(step) => done = render(&session, &step),
                Err(e) => {
                    warn!(error = %e, "tick failed");
                    eprintln!("error: {e}");
                }
            },
            line = lines.next_line() => {
                let Some(line) = line? else {
                    debug!("stdin closed");
                    session.interrupt(FinishReason::Finished);
                    break;
                };
                match Input::parse(&line) {
                    Some(Input::Quit) => {
                        session.interrupt(FinishReason::Finished);
                        break;
                    }
                    Some(input) => match handle(&mut session, input) {
                        Ok(step) => done = render(&session, &step),
                        Err(e) => {
                            warn!(error = %e, "command failed");
                            eprintln!("error: {e}");
                        }
                    },
                    None if line.trim().is_empty() => {}
                    None => println!("{HELP}"),
                }
            }
        }
        sync_ticker(&session, &mut ticker, &mut rx);
    }
    ticker.stop();

    if done {
        let duration = session.finish_workout()?;
        println!(
            "Workout complete in {}.",
            humantime::format_duration(std::time::Duration::from_secs(duration.as_secs()))
        );
    }
    Ok(())
}

fn handle(session: &mut WorkoutSession, input: Input) -> Result<SessionStep, OneRepError> {
    let step = match input {
        Input::Toggle => {
            let running = session.toggle();
            println!("{}", if running { "▶ resumed" } else { "⏸ paused" });
            SessionStep::default()
        }
        Input::Skip if session.timer().phase() == TimerPhase::Rest => session.skip_rest()?,
        Input::Skip => session.skip_phase()?,
        Input::Reset => {
            session.reset_phase();
            println!("↺ phase reset (paused)");
            SessionStep::default()
        }
        Input::AnotherSet => session.another_set()?,
        Input::Switch(name) => {
            let id = session.registry().find_by_name(&name)?.id;
            session.switch_exercise(id)?
        }
        Input::Log { weight, failure } => {
            let logged = session.log_set(weight, failure, SetDetails::default())?;
            print_logged(&logged.entry.exercise_name, weight, logged.is_personal_record);
            SessionStep::default()
        }
        Input::Help | Input::Quit => {
            println!("{HELP}");
            SessionStep::default()
        }
    };
    Ok(step)
}

/// Prints what happened. Returns whether the workout is complete.
fn render(session: &WorkoutSession, step: &SessionStep) -> bool {
    if let Some(id) = step.started {
        if let Some(exercise) = session.registry().find(id) {
            let weight = exercise
                .last_weight
                .map(|w| format!(" @ {w}"))
                .unwrap_or_default();
            println!("\n▶ {}{weight}", exercise.name);
        }
    }
    for t in &step.transitions {
        println!(
            "\n{} ({}s)",
            t.to.display_name(),
            session.timer().settings().duration(t.to)
        );
    }
    if let Some(logged) = &step.logged {
        print_logged(
            &logged.entry.exercise_name,
            logged.entry.weight,
            logged.is_personal_record,
        );
    }
    if let Some(error) = &step.save_error {
        eprintln!("warning: set not saved: {error}");
    }
    if step.workout_complete {
        info!("workout complete");
        println!("\n🏁 All exercises done!");
        return true;
    }

    let timer = session.timer();
    if timer.is_running() {
        print!("\r  {:<16} {:>4}s ", timer.phase().display_name(), timer.remaining());
        let _ = std::io::stdout().flush();
    }
    false
}

fn print_logged(name: &str, weight: f64, personal_record: bool) {
    let pr = if personal_record { "  🏆 new PR!" } else { "" };
    println!("\n✔ logged {name}: {weight}{pr}");
}

/// Keeps the tick task alive exactly while the timer runs. Ticks queued
/// before a pause are dropped.
fn sync_ticker(
    session: &WorkoutSession,
    ticker: &mut Ticker,
    rx: &mut mpsc::UnboundedReceiver<Tick>,
) {
    let running = session.timer().is_running();
    if running && !ticker.is_running() {
        ticker.start();
    } else if !running && ticker.is_running() {
        ticker.stop();
        while rx.try_recv().is_ok() {}
    }
}
