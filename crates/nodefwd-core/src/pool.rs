//! Endpoint pool: one live connection per configured backend address.

use std::sync::Arc;

use crate::client::{NodeClient, NodeConnector};
use crate::error::ForwardError;

/// Eagerly-constructed pool of node connections.
///
/// Construction is all-or-nothing: if any address fails to connect, every
/// connection opened so far is released before the error is returned.
/// After construction the pool is immutable; count equals the address list
/// length and is always > 0.
pub struct EndpointPool {
    clients: Vec<Arc<dyn NodeClient>>,
}

impl std::fmt::Debug for EndpointPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EndpointPool")
            .field("clients", &self.clients.len())
            .finish()
    }
}

impl EndpointPool {
    /// Open one connection per address, in order.
    pub async fn connect(
        urls: &[String],
        connector: &dyn NodeConnector,
    ) -> Result<Self, ForwardError> {
        if urls.is_empty() {
            return Err(ForwardError::EmptyEndpoints);
        }

        let mut clients: Vec<Arc<dyn NodeClient>> = Vec::with_capacity(urls.len());
        for url in urls {
            match connector.connect(url).await {
                Ok(client) => {
                    tracing::info!(url = %url, "connected to endpoint");
                    clients.push(client);
                }
                Err(e) => {
                    tracing::error!(url = %url, error = %e, "endpoint connect failed, rolling back");
                    for opened in &clients {
                        if let Err(close_err) = opened.close().await {
                            tracing::warn!(
                                url = %opened.url(),
                                error = %close_err,
                                "failed to close connection during rollback"
                            );
                        }
                    }
                    return Err(e);
                }
            }
        }

        Ok(Self { clients })
    }

    /// Number of endpoints in the pool.
    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    /// Connection for a modular index.
    pub fn client_at(&self, index: usize) -> Arc<dyn NodeClient> {
        self.clients[index % self.clients.len()].clone()
    }

    /// Release every connection. Close failures are logged and the first
    /// one is returned, but the loop always attempts the remainder.
    ///
    /// Single-shot: callers must ensure no operations are in flight, and
    /// must not call this twice.
    pub async fn shutdown(&self) -> Result<(), ForwardError> {
        let mut first_err = None;
        for client in &self.clients {
            if let Err(e) = client.close().await {
                tracing::warn!(url = %client.url(), error = %e, "endpoint close failed");
                first_err.get_or_insert(e);
            }
        }
        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use crate::client::SubmitMode;

    #[derive(Default)]
    struct CloseLog {
        closed: Mutex<Vec<String>>,
    }

    struct MockClient {
        url: String,
        log: Arc<CloseLog>,
        fail_close: bool,
    }

    #[async_trait]
    impl NodeClient for MockClient {
        async fn node_time(&self) -> Result<String, ForwardError> {
            Ok("2024-01-01T00:00:00Z".into())
        }
        async fn last_block_height(&self) -> Result<u64, ForwardError> {
            Ok(1)
        }
        async fn submit_transaction(
            &self,
            _payload: &[u8],
            _mode: SubmitMode,
        ) -> Result<(), ForwardError> {
            Ok(())
        }
        async fn close(&self) -> Result<(), ForwardError> {
            self.log.closed.lock().unwrap().push(self.url.clone());
            if self.fail_close {
                Err(ForwardError::Close(format!("{} refused to close", self.url)))
            } else {
                Ok(())
            }
        }
        fn url(&self) -> &str {
            &self.url
        }
    }

    /// Connects successfully until `fail_at` (0-based), then errors.
    struct MockConnector {
        log: Arc<CloseLog>,
        fail_at: Option<usize>,
        fail_close_on: Vec<String>,
        attempts: AtomicUsize,
    }

    impl MockConnector {
        fn new(log: Arc<CloseLog>) -> Self {
            Self {
                log,
                fail_at: None,
                fail_close_on: vec![],
                attempts: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl NodeConnector for MockConnector {
        async fn connect(&self, url: &str) -> Result<Arc<dyn NodeClient>, ForwardError> {
            let n = self.attempts.fetch_add(1, Ordering::SeqCst);
            if self.fail_at == Some(n) {
                return Err(ForwardError::Connect {
                    url: url.into(),
                    reason: "refused".into(),
                });
            }
            Ok(Arc::new(MockClient {
                url: url.into(),
                log: self.log.clone(),
                fail_close: self.fail_close_on.iter().any(|u| u == url),
            }))
        }
    }

    fn urls(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("ws://node{i}")).collect()
    }

    #[tokio::test]
    async fn empty_list_rejected_before_any_connect() {
        let log = Arc::new(CloseLog::default());
        let connector = MockConnector::new(log.clone());
        let err = EndpointPool::connect(&[], &connector).await.unwrap_err();
        assert!(matches!(err, ForwardError::EmptyEndpoints));
        assert_eq!(connector.attempts.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn all_connections_opened() {
        let log = Arc::new(CloseLog::default());
        let connector = MockConnector::new(log);
        let pool = EndpointPool::connect(&urls(3), &connector).await.unwrap();
        assert_eq!(pool.len(), 3);
        assert_eq!(pool.client_at(4).url(), "ws://node1");
    }

    #[tokio::test]
    async fn partial_failure_releases_opened_connections() {
        let log = Arc::new(CloseLog::default());
        let mut connector = MockConnector::new(log.clone());
        connector.fail_at = Some(2);

        let err = EndpointPool::connect(&urls(4), &connector).await.unwrap_err();
        assert!(matches!(err, ForwardError::Connect { .. }));
        assert_eq!(
            *log.closed.lock().unwrap(),
            vec!["ws://node0".to_string(), "ws://node1".to_string()]
        );
    }

    #[tokio::test]
    async fn shutdown_closes_all_and_reports_first_failure() {
        let log = Arc::new(CloseLog::default());
        let mut connector = MockConnector::new(log.clone());
        connector.fail_close_on = vec!["ws://node0".into(), "ws://node1".into()];

        let pool = EndpointPool::connect(&urls(3), &connector).await.unwrap();
        let err = pool.shutdown().await.unwrap_err();

        // Every connection was attempted despite the early failure.
        assert_eq!(log.closed.lock().unwrap().len(), 3);
        match err {
            ForwardError::Close(msg) => assert!(msg.contains("node0")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn shutdown_ok_when_all_close() {
        let log = Arc::new(CloseLog::default());
        let connector = MockConnector::new(log.clone());
        let pool = EndpointPool::connect(&urls(2), &connector).await.unwrap();
        pool.shutdown().await.unwrap();
        assert_eq!(log.closed.lock().unwrap().len(), 2);
    }
}
