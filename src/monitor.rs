use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use reqwest::Client;
use tokio::time;
use tracing::{debug, error, info};

use crate::check::{build_client, run_checks_once};
use crate::config::Settings;
use crate::models::EndpointSpec;
use crate::reporting::format_report;
use crate::stats::{CycleStats, aggregate};
use crate::storage::{ReportSink, write_report};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Running,
    Stopped,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub cycles: u64,
    pub write_failures: u64,
}

/// Drives probe → aggregate → report cycles at a fixed interval.
pub struct Monitor {
    endpoints: Arc<[EndpointSpec]>,
    client: Client,
    sink: ReportSink,
    interval: Duration,
    request_timeout: Duration,
    max_concurrent_probes: Option<usize>,
    max_cycles: Option<u64>,
    state: SchedulerState,
}

impl Monitor {
    pub fn new(
        endpoints: Vec<EndpointSpec>,
        settings: &Settings,
        sink: ReportSink,
    ) -> reqwest::Result<Self> {
        let client = build_client(&settings.user_agent, settings.request_timeout)?;
        Ok(Self {
            endpoints: endpoints.into(),
            client,
            sink,
            interval: settings.interval(),
            request_timeout: settings.request_timeout,
            max_concurrent_probes: settings.max_concurrent_probes,
            max_cycles: None,
            state: SchedulerState::Running,
        })
    }

    /// Stop after `cycles` completed cycles instead of waiting for a signal.
    pub fn with_max_cycles(mut self, cycles: Option<u64>) -> Self {
        self.max_cycles = cycles;
        self
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn sink(&self) -> &ReportSink {
        &self.sink
    }

    /// Runs one probe fan-out and returns the fresh per-cycle stats.
    pub async fn probe_cycle(&self) -> CycleStats {
        let started = time::Instant::now();
        let results = run_checks_once(
            &self.client,
            &self.endpoints,
            self.request_timeout,
            self.max_concurrent_probes,
        )
        .await;
        let stats = aggregate(&results);
        let down = results.iter().filter(|r| !r.is_up()).count();
        let slowest = results.iter().map(|r| r.elapsed).max().unwrap_or_default();
        debug!(
            probes = stats.total_probes(),
            up = stats.total_up(),
            down,
            domains = stats.len(),
            slowest = %humantime::format_duration(truncate_millis(slowest)),
            elapsed = %humantime::format_duration(truncate_millis(started.elapsed())),
            "cycle probes finished"
        );
        stats
    }

    /// Loops until `shutdown` resolves or the cycle limit is reached.
    ///
    /// Shutdown is honoured while probes are in flight and while sleeping.
    /// A report write that has started always completes.
    pub async fn run<F>(&mut self, shutdown: F) -> RunSummary
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let mut summary = RunSummary::default();

        info!(
            endpoints = self.endpoints.len(),
            interval = %humantime::format_duration(self.interval),
            sink = %self.sink,
            "Starting health monitoring"
        );

        while self.state == SchedulerState::Running {
            let started_at = Local::now().naive_local();

            let stats = tokio::select! {
                biased;
                _ = &mut shutdown => None,
                stats = self.probe_cycle() => Some(stats),
            };
            let Some(stats) = stats else {
                self.state = SchedulerState::Stopped;
                break;
            };

            let block = format_report(started_at, &stats);
            if let Err(e) = write_report(&self.sink, block).await {
                summary.write_failures += 1;
                error!("Failed to write report: {}", e);
            }
            summary.cycles += 1;

            if self.max_cycles.is_some_and(|max| summary.cycles >= max) {
                self.state = SchedulerState::Stopped;
                break;
            }

            let interrupted = tokio::select! {
                biased;
                _ = &mut shutdown => true,
                _ = time::sleep(self.interval) => false,
            };
            if interrupted {
                self.state = SchedulerState::Stopped;
            }
        }

        info!(cycles = summary.cycles, "Monitoring stopped");
        summary
    }
}

fn truncate_millis(d: Duration) -> Duration {
    Duration::from_millis(d.as_millis() as u64)
}

/// Resolves on Ctrl+C, or SIGTERM on unix.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
        _ = terminate => info!("Received SIGTERM, shutting down..."),
    }
}
