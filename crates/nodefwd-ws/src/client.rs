//! WebSocket JSON-RPC node client.
//!
//! One persistent connection per endpoint. The socket is owned by a
//! background task; callers multiplex requests over a command channel and
//! get their response back through a `oneshot`. There is no reconnect: a
//! broken connection fails every subsequent call on this client, and the
//! forwarding layer routes around it by re-selecting on retry.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::Value;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use nodefwd_core::client::{NodeClient, NodeConnector, SubmitMode};
use nodefwd_core::error::{ForwardError, RpcFailure};

use crate::wire::{RpcId, RpcRequest, RpcResponse};

type ResponseSender = oneshot::Sender<Result<RpcResponse, ForwardError>>;

/// Command sent from callers to the background socket task.
enum WsCommand {
    Send { req: RpcRequest, tx: ResponseSender },
    Close { tx: oneshot::Sender<Result<(), ForwardError>> },
}

#[derive(Deserialize)]
struct NodeStatus {
    time: String,
}

/// WebSocket-backed [`NodeClient`].
#[derive(Debug)]
pub struct WsNodeClient {
    url: String,
    cmd_tx: mpsc::UnboundedSender<WsCommand>,
    req_id: AtomicU64,
}

impl WsNodeClient {
    /// Open the socket and start the background task. The handshake runs
    /// here, so an unreachable endpoint fails construction, which is
    /// what lets the pool roll back eagerly.
    pub async fn connect(url: impl Into<String>) -> Result<Self, ForwardError> {
        let url = url.into();
        let (stream, _) = tokio_tungstenite::connect_async(&url)
            .await
            .map_err(|e| ForwardError::Connect {
                url: url.clone(),
                reason: e.to_string(),
            })?;

        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel::<WsCommand>();
        let task_url = url.clone();
        tokio::spawn(async move {
            ws_task(task_url, stream, cmd_rx).await;
        });

        Ok(Self {
            url,
            cmd_tx,
            req_id: AtomicU64::new(1),
        })
    }

    async fn call(&self, method: &str, params: Vec<Value>) -> Result<Value, ForwardError> {
        let id = self.req_id.fetch_add(1, Ordering::Relaxed);
        let req = RpcRequest::new(id, method, params);
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(WsCommand::Send { req, tx })
            .map_err(|_| ForwardError::Transport("connection task stopped".into()))?;
        let resp = rx
            .await
            .map_err(|_| ForwardError::Transport("response channel dropped".into()))??;
        resp.into_result().map_err(|e| {
            ForwardError::Rpc(RpcFailure {
                code: e.code,
                message: e.message,
                details: e.data,
            })
        })
    }
}

#[async_trait]
impl NodeClient for WsNodeClient {
    async fn node_time(&self) -> Result<String, ForwardError> {
        let value = self.call("node_status", vec![]).await?;
        let status: NodeStatus = serde_json::from_value(value)?;
        Ok(status.time)
    }

    async fn last_block_height(&self) -> Result<u64, ForwardError> {
        let value = self.call("last_block_height", vec![]).await?;
        Ok(serde_json::from_value(value)?)
    }

    async fn submit_transaction(
        &self,
        payload: &[u8],
        mode: SubmitMode,
    ) -> Result<(), ForwardError> {
        let params = vec![
            Value::String(hex::encode(payload)),
            Value::String(mode.to_string()),
        ];
        // Any non-error response is the backend's acknowledgement.
        self.call("submit_transaction", params).await?;
        Ok(())
    }

    async fn close(&self) -> Result<(), ForwardError> {
        let (tx, rx) = oneshot::channel();
        if self.cmd_tx.send(WsCommand::Close { tx }).is_err() {
            // Task already gone, nothing left to release.
            return Ok(());
        }
        rx.await.unwrap_or(Ok(()))
    }

    fn url(&self) -> &str {
        &self.url
    }
}

/// Background task that owns the socket for its whole life.
async fn ws_task(
    url: String,
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
    mut cmd_rx: mpsc::UnboundedReceiver<WsCommand>,
) {
    let (mut sink, mut source) = stream.split();
    let mut pending: HashMap<u64, ResponseSender> = HashMap::new();

    loop {
        tokio::select! {
            cmd = cmd_rx.recv() => {
                match cmd {
                    None => return,
                    Some(WsCommand::Close { tx }) => {
                        let result = sink
                            .close()
                            .await
                            .map_err(|e| ForwardError::Close(e.to_string()));
                        let _ = tx.send(result);
                        fail_pending(&mut pending, "connection closed");
                        return;
                    }
                    Some(WsCommand::Send { req, tx }) => {
                        let id = match &req.id {
                            RpcId::Number(n) => *n,
                            _ => 0,
                        };
                        let msg = match serde_json::to_string(&req) {
                            Ok(msg) => msg,
                            Err(e) => {
                                let _ = tx.send(Err(ForwardError::Deserialization(e)));
                                continue;
                            }
                        };
                        pending.insert(id, tx);
                        if let Err(e) = sink.send(Message::Text(msg.into())).await {
                            tracing::warn!(url = %url, error = %e, "socket send failed");
                            break;
                        }
                    }
                }
            }
            msg = source.next() => {
                match msg {
                    None => break,
                    Some(Err(e)) => {
                        tracing::warn!(url = %url, error = %e, "socket receive error");
                        break;
                    }
                    Some(Ok(Message::Text(text))) => {
                        dispatch(text.as_str(), &mut pending);
                    }
                    Some(Ok(Message::Close(_))) => break,
                    _ => {}
                }
            }
        }
    }

    // Socket lost. Fail in-flight calls and keep answering until close.
    tracing::warn!(url = %url, "connection lost");
    fail_pending(&mut pending, "connection lost");
    while let Some(cmd) = cmd_rx.recv().await {
        match cmd {
            WsCommand::Send { tx, .. } => {
                let _ = tx.send(Err(ForwardError::Transport("connection lost".into())));
            }
            WsCommand::Close { tx } => {
                let _ = tx.send(Ok(()));
                return;
            }
        }
    }
}

fn dispatch(text: &str, pending: &mut HashMap<u64, ResponseSender>) {
    let Ok(resp) = serde_json::from_str::<RpcResponse>(text) else {
        tracing::debug!("unparseable message from node");
        return;
    };
    let id = match &resp.id {
        RpcId::Number(n) => *n,
        _ => return,
    };
    if let Some(tx) = pending.remove(&id) {
        let _ = tx.send(Ok(resp));
    }
}

fn fail_pending(pending: &mut HashMap<u64, ResponseSender>, reason: &str) {
    for (_, tx) in pending.drain() {
        let _ = tx.send(Err(ForwardError::Transport(reason.into())));
    }
}

/// Opens [`WsNodeClient`] connections for the endpoint pool.
#[derive(Debug, Default)]
pub struct WsConnector;

impl WsConnector {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl NodeConnector for WsConnector {
    async fn connect(&self, url: &str) -> Result<Arc<dyn NodeClient>, ForwardError> {
        Ok(Arc::new(WsNodeClient::connect(url).await?))
    }
}
