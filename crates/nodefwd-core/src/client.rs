//! The `NodeClient` trait — one live connection to a backend node.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::ForwardError;

/// How eagerly the backend should confirm acceptance of a submitted
/// transaction before acknowledging. The tag is passed through verbatim;
/// its meaning belongs to the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitMode {
    /// Acknowledge immediately, without waiting for any processing.
    FireAndForget,
    /// Acknowledge once the transaction passed the backend's checks.
    AwaitAck,
    /// Acknowledge only after the transaction was included in a block.
    AwaitInclusion,
}

impl std::fmt::Display for SubmitMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FireAndForget => write!(f, "fire-and-forget"),
            Self::AwaitAck => write!(f, "await-ack"),
            Self::AwaitInclusion => write!(f, "await-inclusion"),
        }
    }
}

/// A persistent connection to one backend node.
///
/// # Thread Safety
/// Implementations must be `Send + Sync`; a single connection is used
/// concurrently by many logical calls without external serialization.
///
/// # Object Safety
/// The trait is object-safe and is stored as `Arc<dyn NodeClient>`.
#[async_trait]
pub trait NodeClient: Send + Sync + 'static {
    /// Lightweight liveness call; returns the node's current time.
    async fn node_time(&self) -> Result<String, ForwardError>;

    /// Query the current chain height.
    async fn last_block_height(&self) -> Result<u64, ForwardError>;

    /// Send a signed transaction payload. `Ok` means the backend
    /// acknowledged acceptance under the given mode.
    async fn submit_transaction(
        &self,
        payload: &[u8],
        mode: SubmitMode,
    ) -> Result<(), ForwardError>;

    /// Release the underlying connection. Single-shot: calling it twice
    /// has undefined effect on an already-released connection.
    async fn close(&self) -> Result<(), ForwardError>;

    /// Endpoint identifier (URL) for logging.
    fn url(&self) -> &str;
}

/// Factory that opens a [`NodeClient`] for an address.
///
/// Lets the pool establish connections without naming a transport, and
/// lets tests inject mock clients.
#[async_trait]
pub trait NodeConnector: Send + Sync {
    async fn connect(&self, url: &str) -> Result<Arc<dyn NodeClient>, ForwardError>;
}
