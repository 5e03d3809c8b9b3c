use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use config::{Config, Environment, File};
use reqwest::Method;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::Deserialize;
use url::{Host, Url};

use crate::cli::Cli;
use crate::error::ConfigError;
use crate::models::EndpointSpec;

pub const DEFAULT_INTERVAL_SECONDS: u64 = 15;
pub const DEFAULT_REQUEST_TIMEOUT: &str = "500ms";

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub interval_seconds: u64,
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
    pub user_agent: String,
    pub max_concurrent_probes: Option<usize>,
    pub logfile: Option<String>,
}

impl Settings {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_seconds)
    }

    fn validate(self) -> Result<Self, ConfigError> {
        if self.interval_seconds == 0 {
            return Err(ConfigError::InvalidSetting {
                key: "interval_seconds",
                reason: "must be at least 1".into(),
            });
        }
        if self.request_timeout.is_zero() {
            return Err(ConfigError::InvalidSetting {
                key: "request_timeout",
                reason: "must be greater than zero".into(),
            });
        }
        if self.max_concurrent_probes == Some(0) {
            return Err(ConfigError::InvalidSetting {
                key: "max_concurrent_probes",
                reason: "must be at least 1 when set".into(),
            });
        }
        Ok(self)
    }
}

/// Defaults, then the settings file, then `HEALTHPOLL__*` env vars, then CLI flags.
pub fn load_settings(cli: &Cli) -> Result<Settings, ConfigError> {
    let file_source = match &cli.settings {
        Some(path) => File::from(path.as_path()).required(true),
        None => File::with_name("config/default").required(false),
    };

    let settings = Config::builder()
        .set_default("interval_seconds", DEFAULT_INTERVAL_SECONDS as i64)?
        .set_default("request_timeout", DEFAULT_REQUEST_TIMEOUT)?
        .set_default(
            "user_agent",
            concat!("healthpoll/", env!("CARGO_PKG_VERSION")),
        )?
        .add_source(file_source)
        .add_source(Environment::with_prefix("HEALTHPOLL").separator("__"))
        .set_override_option("interval_seconds", cli.interval.map(|s| s as i64))?
        .set_override_option("logfile", cli.logfile.clone())?
        .build()?;

    settings.try_deserialize::<Settings>()?.validate()
}

#[derive(Debug, Deserialize)]
struct EndpointEntry {
    url: Option<String>,
    method: Option<String>,
    #[serde(default)]
    headers: HashMap<String, String>,
    body: Option<serde_json::Value>,
}

/// Reads the endpoint list once and validates every entry.
pub fn load_endpoints(path: impl AsRef<Path>) -> Result<Vec<EndpointSpec>, ConfigError> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_endpoints(&raw, path)
}

fn parse_endpoints(raw: &str, path: &Path) -> Result<Vec<EndpointSpec>, ConfigError> {
    if raw.trim().is_empty() {
        return Err(ConfigError::Empty {
            path: path.to_path_buf(),
        });
    }

    let entries: Option<Vec<EndpointEntry>> =
        serde_yaml::from_str(raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
    let entries = entries.unwrap_or_default();
    if entries.is_empty() {
        return Err(ConfigError::Empty {
            path: path.to_path_buf(),
        });
    }

    entries
        .into_iter()
        .enumerate()
        .map(|(index, entry)| build_endpoint(index, entry))
        .collect()
}

fn build_endpoint(index: usize, entry: EndpointEntry) -> Result<EndpointSpec, ConfigError> {
    let raw_url = entry.url.ok_or(ConfigError::MissingUrl { index })?;
    let url = Url::parse(&raw_url).map_err(|source| ConfigError::InvalidUrl {
        index,
        url: raw_url.clone(),
        source,
    })?;
    // IPv6 hosts are stored without brackets.
    let domain = match url.host() {
        Some(Host::Domain(host)) if !host.is_empty() => host.to_string(),
        Some(Host::Ipv4(addr)) => addr.to_string(),
        Some(Host::Ipv6(addr)) => addr.to_string(),
        _ => return Err(ConfigError::MissingHost { index, url: raw_url }),
    };

    let method = match entry.method {
        Some(m) => Method::from_bytes(m.trim().to_ascii_uppercase().as_bytes())
            .map_err(|_| ConfigError::InvalidMethod { index, method: m })?,
        None => Method::GET,
    };

    let mut headers = HeaderMap::with_capacity(entry.headers.len());
    for (name, value) in entry.headers {
        let header_name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| ConfigError::InvalidHeader { index, name: name.clone() })?;
        let header_value = HeaderValue::from_str(&value)
            .map_err(|_| ConfigError::InvalidHeader { index, name: name.clone() })?;
        headers.insert(header_name, header_value);
    }

    Ok(EndpointSpec {
        url,
        method,
        headers,
        body: entry.body,
        domain,
    })
}
