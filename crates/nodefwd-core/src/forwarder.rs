//! The public forwarding facade: construction, the three operations, and
//! shutdown.
//!
//! Every operation runs through a bounded retry loop that re-selects an
//! endpoint on each attempt, so a failing endpoint is routed around on the
//! next try without any health bookkeeping.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::client::{NodeClient, NodeConnector, SubmitMode};
use crate::error::ForwardError;
use crate::pool::EndpointPool;
use crate::retry::{RetryConfig, RetryPolicy};
use crate::selector::RoundRobin;

/// Configuration for a [`Forwarder`].
#[derive(Debug, Clone)]
pub struct ForwarderConfig {
    /// Retry budget and backoff schedule.
    pub retry: RetryConfig,
    /// Deadline per individual attempt.
    pub request_timeout: Duration,
}

impl Default for ForwarderConfig {
    fn default() -> Self {
        Self {
            retry: RetryConfig::default(),
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// Routes operations to one of several equivalent backend nodes.
///
/// Safe to share by reference across tasks: the only mutable state is the
/// selection cursor, and backoff sleeps block only the calling task. The
/// operation futures are plain `async fn`s: dropping one (e.g. from an
/// enclosing `select!` or timeout) cancels the in-flight attempt and any
/// backoff wait with it.
pub struct Forwarder {
    pool: EndpointPool,
    selector: RoundRobin,
    policy: RetryPolicy,
    request_timeout: Duration,
}

impl Forwarder {
    /// Connect to every address eagerly. Fails with
    /// [`ForwardError::EmptyEndpoints`] on an empty list, or with the
    /// connect error if any endpoint is unreachable (connections opened so
    /// far are released first).
    pub async fn connect(
        urls: &[String],
        connector: &dyn NodeConnector,
        config: ForwarderConfig,
    ) -> Result<Self, ForwardError> {
        let pool = EndpointPool::connect(urls, connector).await?;
        Ok(Self {
            pool,
            selector: RoundRobin::new(),
            policy: RetryPolicy::new(config.retry),
            request_timeout: config.request_timeout,
        })
    }

    /// Liveness probe against the next endpoint in rotation. The node's
    /// reported time is logged and discarded.
    pub async fn health_check(&self) -> Result<(), ForwardError> {
        self.with_retry("health_check", |client| async move {
            let time = client.node_time().await?;
            tracing::info!(node_time = %time, url = %client.url(), "endpoint is alive");
            Ok(())
        })
        .await
    }

    /// Current chain height from the next endpoint in rotation.
    pub async fn last_block_height(&self) -> Result<u64, ForwardError> {
        self.with_retry("last_block_height", |client| async move {
            client.last_block_height().await
        })
        .await
    }

    /// Submit a signed transaction payload with an opaque submission-mode
    /// tag. A backend rejection is retried like any transport failure.
    ///
    /// Hazard: after an ambiguous failure (e.g. a timeout once the backend
    /// already accepted the payload), the retry lands on another endpoint
    /// and may submit a duplicate. Callers for whom this matters should
    /// set `max_retries` to zero and retry at their own layer.
    pub async fn submit_transaction(
        &self,
        payload: &[u8],
        mode: SubmitMode,
    ) -> Result<(), ForwardError> {
        self.with_retry("submit_transaction", |client| async move {
            client.submit_transaction(payload, mode).await
        })
        .await
    }

    /// Release every pooled connection. Single-shot; callers must ensure
    /// no operations are still in flight.
    pub async fn shutdown(&self) -> Result<(), ForwardError> {
        self.pool.shutdown().await
    }

    /// Retry executor: select an endpoint, run one attempt under the
    /// per-request deadline, back off and re-select on failure. On
    /// exhaustion the most recent failure is returned unchanged.
    async fn with_retry<T, F, Fut>(&self, op: &'static str, mut f: F) -> Result<T, ForwardError>
    where
        F: FnMut(Arc<dyn NodeClient>) -> Fut,
        Fut: Future<Output = Result<T, ForwardError>>,
    {
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            let client = self.pool.client_at(self.selector.next(self.pool.len()));
            let url = client.url().to_string();
            tracing::info!(op, attempt, url = %url, "dispatching attempt");

            let result = match tokio::time::timeout(self.request_timeout, f(client)).await {
                Ok(result) => result,
                Err(_) => Err(ForwardError::Timeout {
                    ms: self.request_timeout.as_millis() as u64,
                }),
            };

            match result {
                Ok(value) => return Ok(value),
                Err(e) if !e.is_retryable() => {
                    tracing::error!(op, attempt, url = %url, error = %e, "non-retryable failure");
                    return Err(e);
                }
                Err(e) => match self.policy.next_delay(attempt) {
                    Some(delay) => {
                        tracing::warn!(
                            op,
                            attempt,
                            delay_ms = delay.as_millis() as u64,
                            url = %url,
                            error = %e,
                            "attempt failed, retrying"
                        );
                        tokio::time::sleep(delay).await;
                    }
                    None => {
                        tracing::error!(op, attempt, url = %url, error = %e, "retries exhausted");
                        return Err(e);
                    }
                },
            }
        }
    }
}
