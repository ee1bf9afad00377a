//! Forwarding-layer error types.

use serde_json::Value;
use thiserror::Error;

/// A structured failure reported by the backend node: a status code from
/// the backend's vocabulary, a message, and an optional blob of attached
/// detail records.
#[derive(Debug, Clone)]
pub struct RpcFailure {
    pub code: i64,
    pub message: String,
    pub details: Option<Value>,
}

impl std::fmt::Display for RpcFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "status {}: {}", self.code, self.message)
    }
}

/// Errors produced by the forwarding layer.
#[derive(Debug, Error)]
pub enum ForwardError {
    /// No endpoint addresses were configured.
    #[error("endpoint list is empty")]
    EmptyEndpoints,

    /// A connection could not be established at construction.
    #[error("failed to connect to {url}: {reason}")]
    Connect { url: String, reason: String },

    /// Network/socket failure during a call (connection refused, reset,
    /// broken pipe, etc.).
    #[error("transport error: {0}")]
    Transport(String),

    /// A single attempt exceeded the per-request deadline.
    #[error("request timed out after {ms}ms")]
    Timeout { ms: u64 },

    /// Backend-reported failure carrying status metadata.
    #[error("{0}")]
    Rpc(RpcFailure),

    /// A connection failed to close during shutdown.
    #[error("close error: {0}")]
    Close(String),

    /// Response could not be deserialized.
    #[error("deserialization error: {0}")]
    Deserialization(#[from] serde_json::Error),
}

impl ForwardError {
    /// Returns `true` if a fresh attempt against a re-selected endpoint
    /// may succeed. Backend rejections count as retryable; the retry
    /// loop treats them identically to transport failures.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Transport(_) | Self::Timeout { .. } | Self::Rpc(_) | Self::Deserialization(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_failures_are_retryable() {
        assert!(ForwardError::Transport("reset".into()).is_retryable());
        assert!(ForwardError::Timeout { ms: 100 }.is_retryable());
        assert!(ForwardError::Rpc(RpcFailure {
            code: 3,
            message: "rejected".into(),
            details: None,
        })
        .is_retryable());
    }

    #[test]
    fn lifecycle_failures_are_not_retryable() {
        assert!(!ForwardError::EmptyEndpoints.is_retryable());
        assert!(!ForwardError::Connect {
            url: "ws://node0".into(),
            reason: "refused".into(),
        }
        .is_retryable());
        assert!(!ForwardError::Close("already released".into()).is_retryable());
    }
}
