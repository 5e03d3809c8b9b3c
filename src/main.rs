use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use colored::*;

use healthpoll::cli::Cli;
use healthpoll::config::{load_endpoints, load_settings};
use healthpoll::logging::init_logging;
use healthpoll::monitor::{Monitor, shutdown_signal};
use healthpoll::storage::ReportSink;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {:#}", "error:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let settings = load_settings(&cli)?;
    let endpoints = load_endpoints(&cli.config)?;
    let sink = ReportSink::resolve(settings.logfile.as_deref());

    let mut monitor = Monitor::new(endpoints, &settings, sink)
        .context("Failed to build HTTP client")?
        .with_max_cycles(cli.cycles);

    let summary = monitor.run(shutdown_signal()).await;
    if summary.write_failures > 0 {
        eprintln!(
            "{} {} of {} report(s) could not be written to {}",
            "warning:".yellow().bold(),
            summary.write_failures,
            summary.cycles,
            monitor.sink()
        );
    }
    Ok(())
}
