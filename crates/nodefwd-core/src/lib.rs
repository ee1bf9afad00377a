//! nodefwd-core — endpoint routing and failure normalization for nodefwd.
//!
//! # Overview
//!
//! nodefwd submits time-sensitive operations (health probes, chain-height
//! queries, signed transaction submissions) to one of several equivalent
//! backend node endpoints. The core crate defines:
//!
//! - [`NodeClient`] / [`NodeConnector`] — the transport seam
//! - [`Forwarder`] — the public facade: construction, the three
//!   operations, shutdown
//! - [`EndpointPool`] — one eager connection per configured address
//! - [`RoundRobin`] — fair endpoint selection, re-run on every attempt
//! - [`RetryPolicy`] — count-capped exponential backoff
//! - [`StatusInfo`] — best-effort structured-status extraction from a
//!   failure, for display
//!
//! The core never inspects the wire protocol; concrete transports live in
//! sibling crates and plug in through [`NodeConnector`].

pub mod client;
pub mod error;
pub mod forwarder;
pub mod pool;
pub mod retry;
pub mod selector;
pub mod status;

pub use client::{NodeClient, NodeConnector, SubmitMode};
pub use error::{ForwardError, RpcFailure};
pub use forwarder::{Forwarder, ForwarderConfig};
pub use pool::EndpointPool;
pub use retry::{RetryConfig, RetryPolicy};
pub use selector::RoundRobin;
pub use status::StatusInfo;
