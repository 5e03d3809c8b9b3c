use std::path::PathBuf;

use clap::Parser;

/// Periodically probe HTTP endpoints and report per-domain availability.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to the YAML endpoint list
    pub config: PathBuf,
    /// Polling interval in seconds [default: 15]
    #[arg(short, long)]
    pub interval: Option<u64>,
    /// Report log file; "", "none" or "-" writes to stdout [default: monitor_log.txt next to the executable]
    #[arg(short, long)]
    pub logfile: Option<String>,
    /// Optional runtime settings file (toml, yaml, json)
    #[arg(long)]
    pub settings: Option<PathBuf>,
    /// Stop after this many cycles instead of running until interrupted
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub cycles: Option<u64>,
}
