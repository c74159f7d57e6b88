//! Readiness polling for the model server
//!
//! Probes the service endpoint at a fixed interval until it answers or the
//! attempt budget runs out (15 × 2s by default). Any HTTP response counts as
//! ready, whatever its status or body; connection errors and probe timeouts
//! both count as "not ready yet".
//!
//! Error statuses such as 503 are ready too. The readiness contract reads as if a
//! non-success status should keep polling, but the behavior it preserves treats
//! any answer as ready. Keep it that way unless both are changed together.

use std::future::Future;
use std::time::Duration;

use tracing::{debug, info};

use crate::config::ReadinessConfig;
use crate::error::BootstrapError;

/// Upper bound on a single probe so a hung socket cannot stall the loop
const PROBE_TIMEOUT: Duration = Duration::from_secs(2);

/// HTTP probe against the readiness endpoint
#[derive(Clone)]
pub struct HttpProbe {
    endpoint: String,
    client: reqwest::Client,
}

impl HttpProbe {
    /// Create a probe for the given URL (e.g., "http://127.0.0.1:11434/api/version")
    pub fn new(endpoint: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(PROBE_TIMEOUT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            endpoint: endpoint.into(),
            client,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// One probe; true if the server sent any response at all
    pub async fn probe(&self) -> bool {
        match self.client.get(&self.endpoint).send().await {
            Ok(response) => {
                debug!(endpoint = %self.endpoint, status = %response.status(), "Readiness probe answered");
                true
            }
            Err(e) => {
                debug!(endpoint = %self.endpoint, error = %e, "Readiness probe failed");
                false
            }
        }
    }
}

/// Fixed-interval poll loop
#[derive(Debug, Clone)]
pub struct ReadinessPoller {
    endpoint: String,
    max_attempts: u32,
    interval: Duration,
}

impl ReadinessPoller {
    pub fn new(endpoint: impl Into<String>, config: &ReadinessConfig) -> Self {
        Self {
            endpoint: endpoint.into(),
            max_attempts: config.max_attempts,
            interval: config.interval,
        }
    }

    /// Poll the HTTP endpoint until ready
    ///
    /// Returns the attempt number that succeeded.
    pub async fn wait(&self) -> Result<u32, BootstrapError> {
        let probe = HttpProbe::new(self.endpoint.clone());
        self.wait_with(|| probe.probe()).await
    }

    /// Poll with an arbitrary probe
    ///
    /// Sleeps `interval` between failed attempts, never after the last one.
    pub async fn wait_with<F, Fut>(&self, mut probe: F) -> Result<u32, BootstrapError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = bool>,
    {
        for attempt in 1..=self.max_attempts {
            if probe().await {
                info!(endpoint = %self.endpoint, attempt, "Service ready");
                return Ok(attempt);
            }

            debug!(attempt, max_attempts = self.max_attempts, "Service not ready yet");
            if attempt < self.max_attempts {
                tokio::time::sleep(self.interval).await;
            }
        }

        Err(BootstrapError::ReadinessTimeout {
            endpoint: self.endpoint.clone(),
            attempts: self.max_attempts,
        })
    }
}
