use std::path::PathBuf;

use thiserror::Error;

/// Fatal startup errors. The process exits before the first cycle.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("config file {path} does not list any endpoints")]
    Empty { path: PathBuf },
    #[error("endpoint #{index} is missing the required `url` field")]
    MissingUrl { index: usize },
    #[error("endpoint #{index} has an invalid url `{url}`: {source}")]
    InvalidUrl {
        index: usize,
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("endpoint #{index} url `{url}` has no hostname")]
    MissingHost { index: usize, url: String },
    #[error("endpoint #{index} has an invalid HTTP method `{method}`")]
    InvalidMethod { index: usize, method: String },
    #[error("endpoint #{index} has an invalid header `{name}`")]
    InvalidHeader { index: usize, name: String },
    #[error("failed to load settings: {0}")]
    Settings(#[from] config::ConfigError),
    #[error("invalid setting `{key}`: {reason}")]
    InvalidSetting { key: &'static str, reason: String },
}

/// Why a single probe came back DOWN. Never escapes the probe executor.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProbeError {
    #[error("request timed out")]
    Timeout,
    #[error("connection refused")]
    ConnectionRefused,
    #[error("dns resolution failed")]
    DnsFailure,
    #[error("unexpected status {0}")]
    BadStatus(u16),
    #[error("{0}")]
    Other(String),
}

impl ProbeError {
    pub fn kind(&self) -> &'static str {
        match self {
            ProbeError::Timeout => "timeout",
            ProbeError::ConnectionRefused => "connection_refused",
            ProbeError::DnsFailure => "dns_failure",
            ProbeError::BadStatus(_) => "bad_status",
            ProbeError::Other(_) => "other",
        }
    }
}

impl From<reqwest::Error> for ProbeError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            return ProbeError::Timeout;
        }
        if let Some(status) = err.status() {
            return ProbeError::BadStatus(status.as_u16());
        }

        let mut source = std::error::Error::source(&err);
        while let Some(cause) = source {
            if let Some(io_err) = cause.downcast_ref::<std::io::Error>() {
                match io_err.kind() {
                    std::io::ErrorKind::ConnectionRefused => return ProbeError::ConnectionRefused,
                    std::io::ErrorKind::TimedOut => return ProbeError::Timeout,
                    _ => {}
                }
            }
            source = cause.source();
        }

        ProbeError::Other(err.to_string())
    }
}

/// A report block could not be delivered to its sink. The loop keeps going.
#[derive(Debug, Error)]
pub enum ReportWriteError {
    #[error("failed to write report to {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("report writer task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}
