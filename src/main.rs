//! `onerep` - HIT strength training timer

use clap::Parser;
use tracing::warn;

use onerep::cli::args::Cli;
use onerep::cli::commands::{self, Shutdown};
use onerep::error::ExitCode;
use onerep::observability::{FinishReason, init_logging, init_metrics};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if !cli.quiet {
        init_logging(cli.log_format, cli.verbose, cli.color);
    }
    if let Some(port) = cli.metrics_port {
        if let Err(e) = init_metrics(Some(port)) {
            warn!(error = %e, port, "metrics exporter unavailable");
        }
    }

    let shutdown = Shutdown::new();
    tokio::spawn(watch_signals(shutdown.clone()));

    let result = commands::dispatch(cli, shutdown.clone()).await;

    match result {
        Ok(()) => std::process::exit(shutdown.exit_code().unwrap_or(ExitCode::SUCCESS)),
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(e.exit_code());
        }
    }
}

/// First signal ends the workout cleanly; a second one exits at once.
async fn watch_signals(shutdown: Shutdown) {
    let mut sigterm =
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(s) => Some(s),
            Err(e) => {
                warn!(error = %e, "failed to register SIGTERM handler");
                None
            }
        };

    let first = tokio::select! {
        _ = tokio::signal::ctrl_c() => FinishReason::Interrupted,
        Some(()) = recv(&mut sigterm) => FinishReason::Terminated,
    };
    shutdown.trigger(first);

    tokio::select! {
        _ = tokio::signal::ctrl_c() => std::process::exit(ExitCode::INTERRUPTED),
        Some(()) = recv(&mut sigterm) => std::process::exit(ExitCode::TERMINATED),
    }
}

async fn recv(signal: &mut Option<tokio::signal::unix::Signal>) -> Option<()> {
    match signal {
        Some(s) => s.recv().await,
        None => std::future::pending().await,
    }
}
