use crate::models::CapturePayload;
use anyhow::{Context, Result};
use reqwest::blocking::Client;
use serde::Deserialize;
use std::time::Duration;

fn client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .build()
        .context("Failed to create HTTP client")
}

/// POST a capture to the service. Any transport error or non-2xx status is an `Err`;
/// callers that must not fail decide what to do with it.
pub fn push_capture(endpoint: &str, payload: &CapturePayload, timeout: Duration) -> Result<()> {
    let response = client(timeout)?
        .post(endpoint)
        .json(payload)
        .send()
        .with_context(|| format!("Failed to push to {}", endpoint))?;

    if response.status().is_success() {
        Ok(())
    } else {
        anyhow::bail!(
            "Push failed with status {}: {}",
            response.status(),
            response.text().unwrap_or_else(|_| "unknown error".to_string())
        )
    }
}

#[derive(Debug, Deserialize)]
pub struct HealthStatus {
    pub status: String,
}

/// The health URL that sits next to a capture endpoint,
/// e.g. `http://h:1/capture_prompt` -> `http://h:1/health`
pub fn health_url(endpoint: &str) -> Result<reqwest::Url> {
    let url = reqwest::Url::parse(endpoint)
        .with_context(|| format!("Invalid endpoint URL: {}", endpoint))?;
    url.join("/health")
        .with_context(|| format!("Cannot derive health URL from {}", endpoint))
}

/// GET /health on the service
pub fn check_health(endpoint: &str, timeout: Duration) -> Result<HealthStatus> {
    let url = health_url(endpoint)?;

    let response = client(timeout)?
        .get(url.clone())
        .send()
        .with_context(|| format!("Service unreachable at {}", url))?;

    if !response.status().is_success() {
        anyhow::bail!("Health check failed with status {}", response.status());
    }

    response
        .json::<HealthStatus>()
        .context("Failed to decode health response")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_url_replaces_path() {
        let url = health_url("http://127.0.0.1:8000/capture_prompt").unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:8000/health");

        let url = health_url("http://localhost:9/a/b?x=1").unwrap();
        assert_eq!(url.as_str(), "http://localhost:9/health");
    }

    #[test]
    fn health_url_rejects_garbage() {
        assert!(health_url("not a url").is_err());
    }

    #[test]
    fn push_to_closed_port_is_an_error() {
        // Bind then drop to get a port nothing listens on
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let payload = CapturePayload {
            prompt: "hi".to_string(),
            context: None,
        };

        let endpoint = format!("http://127.0.0.1:{}/capture_prompt", port);
        assert!(push_capture(&endpoint, &payload, Duration::from_millis(500)).is_err());
        assert!(check_health(&endpoint, Duration::from_millis(500)).is_err());
    }
}
