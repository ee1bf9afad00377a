//! nodefwd-ws — WebSocket JSON-RPC transport for nodefwd.
//!
//! # Features
//! - One persistent connection per endpoint, opened eagerly at pool
//!   construction and released at shutdown
//! - Request multiplexing over a single connection
//! - Backend error bodies preserved verbatim for status translation

pub mod client;
pub mod wire;

pub use client::{WsConnector, WsNodeClient};
pub use wire::{RpcErrorBody, RpcRequest, RpcResponse};
