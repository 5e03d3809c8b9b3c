use std::fmt;
use std::time::Duration;

use reqwest::Method;
use reqwest::header::HeaderMap;
use url::Url;

use crate::error::ProbeError;

/// A validated endpoint, built once at load time and never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct EndpointSpec {
    pub url: Url,
    pub method: Method,
    pub headers: HeaderMap,
    pub body: Option<serde_json::Value>,
    /// Hostname of `url`, used as the aggregation key.
    pub domain: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProbeStatus {
    Up,
    Down,
}

impl fmt::Display for ProbeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeStatus::Up => f.write_str("UP"),
            ProbeStatus::Down => f.write_str("DOWN"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProbeResult {
    pub domain: String,
    pub status: ProbeStatus,
    pub error: Option<ProbeError>,
    pub elapsed: Duration,
}

impl ProbeResult {
    pub fn up(domain: impl Into<String>, elapsed: Duration) -> Self {
        Self {
            domain: domain.into(),
            status: ProbeStatus::Up,
            error: None,
            elapsed,
        }
    }

    pub fn down(domain: impl Into<String>, error: ProbeError, elapsed: Duration) -> Self {
        Self {
            domain: domain.into(),
            status: ProbeStatus::Down,
            error: Some(error),
            elapsed,
        }
    }

    pub fn is_up(&self) -> bool {
        self.status == ProbeStatus::Up
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DomainStats {
    pub up_count: usize,
    pub total_count: usize,
}

impl DomainStats {
    pub fn record(&mut self, status: ProbeStatus) {
        self.total_count += 1;
        if status == ProbeStatus::Up {
            self.up_count += 1;
        }
    }

    pub fn availability_percent(&self) -> u8 {
        crate::stats::availability_percent(self.up_count, self.total_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_renders_as_log_words() {
        assert_eq!(ProbeStatus::Up.to_string(), "UP");
        assert_eq!(ProbeStatus::Down.to_string(), "DOWN");
    }

    #[test]
    fn constructors_keep_status_and_error_consistent() {
        let up = ProbeResult::up("a.test", Duration::from_millis(12));
        assert!(up.is_up());
        assert!(up.error.is_none());
        assert_eq!(up.elapsed, Duration::from_millis(12));

        let down = ProbeResult::down("a.test", ProbeError::BadStatus(503), Duration::ZERO);
        assert!(!down.is_up());
        assert_eq!(down.error, Some(ProbeError::BadStatus(503)));
    }
}
