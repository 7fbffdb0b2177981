//! JSON-RPC over WebSocket.
//!
//! One background task owns the read half of the socket and routes every
//! frame: responses by request id, notifications by subscription id. A
//! subscription is registered by the reader itself when the subscribe
//! response arrives, so no notification can overtake its registration.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use meshwallet_core::NetworkConfig;
use meshwallet_error::{Result, RpcContext, WalletError};
use serde_json::{json, Value};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot, Mutex};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use crate::extrinsic::RuntimeVersion;
use crate::rpc::{ExtrinsicStatus, StatusStream, SubstrateClient, SubstrateConnector};

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<Socket, Message>;

/// Returns true for the last notification a subscription will deliver
pub type LastUpdate = fn(&Value) -> bool;

enum Pending {
    Call(oneshot::Sender<Result<Value>>),
    Subscribe(
        oneshot::Sender<Result<mpsc::UnboundedReceiver<Value>>>,
        LastUpdate,
    ),
}

struct Subscription {
    sender: mpsc::UnboundedSender<Value>,
    is_last: LastUpdate,
}

#[derive(Default)]
struct Router {
    pending: HashMap<u64, (String, Pending)>,
    subscriptions: HashMap<String, Subscription>,
    closed: bool,
}

fn subscription_id(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

impl Router {
    /// Tracks a request about to be written. Fails once the reader has
    /// stopped, since nothing would ever answer it.
    fn register(&mut self, id: u64, method: &str, pending: Pending) -> Result<()> {
        if self.closed {
            return Err(connection_closed(method));
        }
        // status streams dropped before their final update
        self.subscriptions.retain(|_, sub| !sub.sender.is_closed());
        self.pending.insert(id, (method.to_string(), pending));
        Ok(())
    }

    /// Dropping the senders fails pending calls and ends subscriptions
    fn close(&mut self) {
        self.closed = true;
        self.pending.clear();
        self.subscriptions.clear();
    }

    fn dispatch(&mut self, frame: Value) {
        if let Some(id) = frame.get("id").and_then(Value::as_u64) {
            let Some((method, pending)) = self.pending.remove(&id) else {
                tracing::debug!(id, "response for unknown request");
                return;
            };
            let result = match frame.get("error") {
                Some(error) => Err(WalletError::Rpc {
                    message: error
                        .get("message")
                        .and_then(Value::as_str)
                        .map_or_else(|| error.to_string(), str::to_string),
                    context: method,
                }),
                None => Ok(frame.get("result").cloned().unwrap_or(Value::Null)),
            };
            match pending {
                Pending::Call(tx) => {
                    let _ = tx.send(result);
                }
                Pending::Subscribe(tx, is_last) => {
                    let registered = result.and_then(|value| {
                        let sub = subscription_id(&value).ok_or_else(|| {
                            WalletError::Encoding(format!("bad subscription id {value}"))
                        })?;
                        let (sender, receiver) = mpsc::unbounded_channel();
                        self.subscriptions.insert(sub, Subscription { sender, is_last });
                        Ok(receiver)
                    });
                    let _ = tx.send(registered);
                }
            }
            return;
        }

        let Some(params) = frame.get("params") else {
            tracing::debug!("ignoring frame without id or params");
            return;
        };
        let Some(sub) = params.get("subscription").and_then(subscription_id) else {
            return;
        };
        let result = params.get("result").cloned().unwrap_or(Value::Null);
        let finished = match self.subscriptions.get(&sub) {
            Some(subscription) => {
                let last = (subscription.is_last)(&result);
                subscription.sender.send(result).is_err() || last
            }
            None => false,
        };
        if finished {
            self.subscriptions.remove(&sub);
        }
    }
}

async fn read_loop(url: String, mut stream: SplitStream<Socket>, router: Arc<Mutex<Router>>) {
    while let Some(message) = stream.next().await {
        match message {
            Ok(Message::Text(text)) => match serde_json::from_str::<Value>(&text) {
                Ok(frame) => router.lock().await.dispatch(frame),
                Err(e) => tracing::warn!(%url, error = %e, "unparseable RPC frame"),
            },
            Ok(Message::Close(_)) => {
                tracing::debug!(%url, "node closed the connection");
                break;
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(%url, error = %e, "websocket read failed");
                break;
            }
        }
    }
    router.lock().await.close();
}

/// JSON-RPC client over one WebSocket connection
pub struct WsClient {
    url: String,
    sink: Mutex<WsSink>,
    router: Arc<Mutex<Router>>,
    next_id: AtomicU64,
    reader: JoinHandle<()>,
}

impl WsClient {
    /// Opens the connection and starts the reader task
    pub async fn connect(url: &str) -> Result<Self> {
        let (socket, _) = connect_async(url)
            .await
            .with_rpc_context(|| format!("connect {url}"))?;
        let (sink, stream) = socket.split();
        let router = Arc::new(Mutex::new(Router::default()));
        let reader = tokio::spawn(read_loop(url.to_string(), stream, Arc::clone(&router)));
        tracing::debug!(%url, "websocket connected");
        Ok(Self {
            url: url.to_string(),
            sink: Mutex::new(sink),
            router,
            next_id: AtomicU64::new(1),
            reader,
        })
    }

    /// Endpoint this client is connected to
    pub fn url(&self) -> &str {
        &self.url
    }

    async fn send(&self, method: &str, params: Value, pending: Pending) -> Result<()> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.router.lock().await.register(id, method, pending)?;

        let body = json!({"jsonrpc": "2.0", "id": id, "method": method, "params": params});
        tracing::debug!(method, id, "rpc request");
        let sent = self.sink.lock().await.send(Message::Text(body.to_string())).await;
        if let Err(e) = sent {
            self.router.lock().await.pending.remove(&id);
            return Err(e).rpc_context(method);
        }
        Ok(())
    }

    /// Calls `method` and waits for its result
    pub async fn request(&self, method: &str, params: Value) -> Result<Value> {
        let (tx, rx) = oneshot::channel();
        self.send(method, params, Pending::Call(tx)).await?;
        rx.await.map_err(|_| connection_closed(method))?
    }

    /// Starts a subscription and returns its notification channel.
    ///
    /// The subscription is forgotten after the update `is_last` accepts
    /// or once the receiver is dropped.
    pub async fn subscribe(
        &self,
        method: &str,
        params: Value,
        is_last: LastUpdate,
    ) -> Result<mpsc::UnboundedReceiver<Value>> {
        let (tx, rx) = oneshot::channel();
        self.send(method, params, Pending::Subscribe(tx, is_last)).await?;
        rx.await.map_err(|_| connection_closed(method))?
    }
}

fn connection_closed(method: &str) -> WalletError {
    WalletError::Rpc {
        context: method.to_string(),
        message: "connection closed before a response arrived".into(),
    }
}

fn is_final_status(update: &Value) -> bool {
    ExtrinsicStatus::from_json(update).is_ok_and(|status| status.is_terminal())
}

fn hex_param(bytes: &[u8]) -> Value {
    Value::String(format!("0x{}", hex::encode(bytes)))
}

fn decode_hex_result(method: &str, value: &Value) -> Result<Vec<u8>> {
    let text = value
        .as_str()
        .ok_or_else(|| WalletError::Encoding(format!("{method} returned {value}, expected hex")))?;
    Ok(hex::decode(text.strip_prefix("0x").unwrap_or(text))?)
}

#[async_trait]
impl SubstrateClient for WsClient {
    async fn genesis_hash(&self) -> Result<String> {
        let value = self.request("chain_getBlockHash", json!([0])).await?;
        value
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| WalletError::Encoding(format!("chain_getBlockHash returned {value}")))
    }

    async fn runtime_version(&self) -> Result<RuntimeVersion> {
        let value = self.request("state_getRuntimeVersion", json!([])).await?;
        serde_json::from_value(value).rpc_context("state_getRuntimeVersion")
    }

    async fn account_next_index(&self, address: &str) -> Result<u64> {
        let value = self.request("system_accountNextIndex", json!([address])).await?;
        value.as_u64().ok_or_else(|| {
            WalletError::Encoding(format!("system_accountNextIndex returned {value}"))
        })
    }

    async fn storage(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let value = self.request("state_getStorage", json!([key])).await?;
        if value.is_null() {
            return Ok(None);
        }
        decode_hex_result("state_getStorage", &value).map(Some)
    }

    async fn state_call(&self, method: &str, data: &[u8]) -> Result<Vec<u8>> {
        let value = self
            .request("state_call", json!([method, hex_param(data)]))
            .await?;
        decode_hex_result(method, &value)
    }

    async fn submit_and_watch(&self, extrinsic: &[u8]) -> Result<StatusStream> {
        let updates = self
            .subscribe(
                "author_submitAndWatchExtrinsic",
                json!([hex_param(extrinsic)]),
                is_final_status,
            )
            .await?;
        let stream = futures::stream::unfold(updates, |mut updates| async move {
            let update = updates.recv().await?;
            Some((ExtrinsicStatus::from_json(&update), updates))
        });
        Ok(stream.boxed())
    }
}

impl Drop for WsClient {
    fn drop(&mut self) {
        self.reader.abort();
    }
}

impl std::fmt::Debug for WsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WsClient").field("url", &self.url).finish()
    }
}

/// Connects with [`WsClient`] to the network's `ws(s)://` endpoint
#[derive(Debug, Clone, Copy, Default)]
pub struct WsConnector;

#[async_trait]
impl SubstrateConnector for WsConnector {
    async fn connect(&self, network: &NetworkConfig) -> Result<Arc<dyn SubstrateClient>> {
        let client = WsClient::connect(&network.rpc_url).await?;
        Ok(Arc::new(client))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_ended(_: &Value) -> bool {
        false
    }

    #[tokio::test]
    async fn test_router_resolves_calls() {
        let mut router = Router::default();
        let (tx, rx) = oneshot::channel();
        router.pending.insert(1, ("chain_getBlockHash".into(), Pending::Call(tx)));
        router.dispatch(json!({"jsonrpc": "2.0", "id": 1, "result": "0xabc"}));
        assert_eq!(rx.await.unwrap().unwrap(), json!("0xabc"));
        assert!(router.pending.is_empty());
    }

    #[tokio::test]
    async fn test_router_maps_rpc_errors() {
        let mut router = Router::default();
        let (tx, rx) = oneshot::channel();
        router.pending.insert(2, ("author_submitExtrinsic".into(), Pending::Call(tx)));
        router.dispatch(json!({
            "jsonrpc": "2.0", "id": 2,
            "error": {"code": 1010, "message": "Invalid Transaction"}
        }));
        let err = rx.await.unwrap().unwrap_err();
        assert!(matches!(
            err,
            WalletError::Rpc { context, message }
                if context == "author_submitExtrinsic" && message == "Invalid Transaction"
        ));
    }

    #[tokio::test]
    async fn test_router_registers_subscription_before_notifications() {
        let mut router = Router::default();
        let (tx, rx) = oneshot::channel();
        router.pending.insert(
            3,
            ("author_submitAndWatchExtrinsic".into(), Pending::Subscribe(tx, open_ended)),
        );
        router.dispatch(json!({"jsonrpc": "2.0", "id": 3, "result": "sub-1"}));
        router.dispatch(json!({
            "jsonrpc": "2.0", "method": "author_extrinsicUpdate",
            "params": {"subscription": "sub-1", "result": "ready"}
        }));
        router.dispatch(json!({
            "jsonrpc": "2.0", "method": "author_extrinsicUpdate",
            "params": {"subscription": "other", "result": "ready"}
        }));

        let mut updates = rx.await.unwrap().unwrap();
        assert_eq!(updates.recv().await, Some(json!("ready")));
        assert!(updates.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_router_drops_closed_subscription() {
        let mut router = Router::default();
        let (sender, receiver) = mpsc::unbounded_channel();
        router.subscriptions.insert(
            "7".into(),
            Subscription {
                sender,
                is_last: open_ended,
            },
        );
        drop(receiver);
        router.dispatch(json!({"params": {"subscription": 7, "result": "ready"}}));
        assert!(router.subscriptions.is_empty());
    }

    #[tokio::test]
    async fn test_router_rejects_requests_after_close() {
        let mut router = Router::default();
        let (tx, rx) = oneshot::channel();
        router.register(1, "state_getStorage", Pending::Call(tx)).unwrap();
        router.close();
        assert!(rx.await.is_err());

        let (tx, _rx) = oneshot::channel();
        let err = router
            .register(2, "state_getStorage", Pending::Call(tx))
            .unwrap_err();
        assert_eq!(err, connection_closed("state_getStorage"));
        assert!(router.pending.is_empty());
    }

    #[tokio::test]
    async fn test_router_forgets_finished_extrinsic_watch() {
        let mut router = Router::default();
        let (tx, rx) = oneshot::channel();
        router
            .register(
                4,
                "author_submitAndWatchExtrinsic",
                Pending::Subscribe(tx, is_final_status),
            )
            .unwrap();
        router.dispatch(json!({"jsonrpc": "2.0", "id": 4, "result": "sub-4"}));
        let mut updates = rx.await.unwrap().unwrap();

        let update = |result: Value| {
            json!({
                "jsonrpc": "2.0", "method": "author_extrinsicUpdate",
                "params": {"subscription": "sub-4", "result": result}
            })
        };
        router.dispatch(update(json!({"inBlock": "0x01"})));
        assert_eq!(router.subscriptions.len(), 1);
        router.dispatch(update(json!({"finalized": "0x01"})));
        assert!(router.subscriptions.is_empty());

        assert_eq!(updates.recv().await, Some(json!({"inBlock": "0x01"})));
        assert_eq!(updates.recv().await, Some(json!({"finalized": "0x01"})));
        assert_eq!(updates.recv().await, None);
    }

    #[tokio::test]
    async fn test_router_prunes_dropped_streams_on_register() {
        let mut router = Router::default();
        let (sender, receiver) = mpsc::unbounded_channel();
        router.subscriptions.insert(
            "9".into(),
            Subscription {
                sender,
                is_last: is_final_status,
            },
        );
        drop(receiver);

        let (tx, _rx) = oneshot::channel();
        router.register(5, "state_getStorage", Pending::Call(tx)).unwrap();
        assert!(router.subscriptions.is_empty());
        assert_eq!(router.pending.len(), 1);
    }
}
