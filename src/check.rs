use std::time::Duration;

use futures::stream::StreamExt;
use reqwest::Client;
use tokio::{net, time};
use tracing::debug;
use url::{Host, Url};

use crate::error::ProbeError;
use crate::models::{EndpointSpec, ProbeResult};

pub fn build_client(user_agent: &str, request_timeout: Duration) -> reqwest::Result<Client> {
    Client::builder()
        .user_agent(user_agent)
        .timeout(request_timeout)
        .build()
}

/// Probes a single endpoint. Every failure collapses into a DOWN result.
pub async fn probe_endpoint(
    client: &Client,
    endpoint: &EndpointSpec,
    timeout: Duration,
) -> ProbeResult {
    let start_time = time::Instant::now();
    let outcome = send_probe(client, endpoint, timeout).await;
    let elapsed = start_time.elapsed();

    let result = match outcome {
        Ok(()) => ProbeResult::up(endpoint.domain.clone(), elapsed),
        Err(e) => ProbeResult::down(endpoint.domain.clone(), e, elapsed),
    };
    match &result.error {
        Some(e) => debug!(
            url = %endpoint.url,
            status = %result.status,
            kind = e.kind(),
            elapsed_ms = result.elapsed.as_millis() as u64,
            "probe failed: {}",
            e
        ),
        None => debug!(
            url = %endpoint.url,
            status = %result.status,
            elapsed_ms = result.elapsed.as_millis() as u64,
            "probe succeeded"
        ),
    }
    result
}

async fn send_probe(
    client: &Client,
    endpoint: &EndpointSpec,
    timeout: Duration,
) -> Result<(), ProbeError> {
    let mut request = client
        .request(endpoint.method.clone(), endpoint.url.clone())
        .headers(endpoint.headers.clone())
        .timeout(timeout);
    if let Some(body) = &endpoint.body {
        request = request.json(body);
    }

    // The whole exchange, body included, has to fit in the timeout.
    let exchange = async {
        let resp = request.send().await?;
        let status = resp.status();
        resp.bytes().await?;
        Ok::<_, reqwest::Error>(status)
    };
    let status = match time::timeout(timeout, exchange).await {
        Err(_) => return Err(ProbeError::Timeout),
        Ok(Err(e)) => return Err(classify_failure(e, &endpoint.url, timeout).await),
        Ok(Ok(status)) => status,
    };

    if status.is_success() {
        Ok(())
    } else {
        Err(ProbeError::BadStatus(status.as_u16()))
    }
}

/// A connect failure whose host no longer resolves is a DNS failure.
async fn classify_failure(err: reqwest::Error, url: &Url, timeout: Duration) -> ProbeError {
    let connect = err.is_connect();
    let error = ProbeError::from(err);
    if connect && matches!(error, ProbeError::Other(_)) && !host_resolves(url, timeout).await {
        return ProbeError::DnsFailure;
    }
    error
}

async fn host_resolves(url: &Url, timeout: Duration) -> bool {
    let host = match url.host() {
        Some(Host::Domain(host)) => host,
        Some(_) => return true,
        None => return false,
    };
    let Some(port) = url.port_or_known_default() else {
        return false;
    };
    match time::timeout(timeout, net::lookup_host((host, port))).await {
        Ok(Ok(mut addrs)) => addrs.next().is_some(),
        _ => false,
    }
}

/// Probes every endpoint concurrently and waits for all of them.
///
/// Results come back in the same order as `endpoints`. `max_concurrent`
/// caps the number of in-flight requests; `None` means all at once.
pub async fn run_checks_once(
    client: &Client,
    endpoints: &[EndpointSpec],
    timeout: Duration,
    max_concurrent: Option<usize>,
) -> Vec<ProbeResult> {
    let limit = max_concurrent.unwrap_or(endpoints.len()).max(1);
    let tasks = endpoints
        .iter()
        .map(|endpoint| probe_endpoint(client, endpoint, timeout));

    futures::stream::iter(tasks)
        .buffered(limit)
        .collect::<Vec<_>>()
        .await
}
