//! Push subscriptions over WebSocket: `newHeads` and, optionally,
//! `newPendingTransactions` on the same connection.
//!
//! # Wire format
//! ```text
//! → {"jsonrpc":"2.0","id":1,"method":"eth_subscribe","params":["newHeads"]}
//! ← {"jsonrpc":"2.0","id":1,"result":"0x9ce5..."}                        (response)
//! ← {"jsonrpc":"2.0","method":"eth_subscription",
//!    "params":{"subscription":"0x9ce5...","result":{"number":"0x1b4",...}}} (notification)
//! ```
//! Responses carry an `id`; notifications carry `method` and `params`.
//! Pending-transaction notifications carry a bare transaction hash as `result`.

use alloy::primitives::{TxHash, B256};
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Deserializer};
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use crate::blockchain::types::{NodeError, NodeResult};

const HEADS_REQUEST_ID: u64 = 1;
const PENDING_REQUEST_ID: u64 = 2;
const UNSUBSCRIBE_REQUEST_ID: u64 = 3;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// A new chain head announced by the node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct HeadNotice {
    #[serde(deserialize_with = "hex_u64")]
    pub number: u64,
    pub hash: B256,
    #[serde(deserialize_with = "hex_u64")]
    pub timestamp: u64,
}

/// Something the node pushed on one of our subscriptions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushNotice {
    Head(HeadNotice),
    PendingTransaction(TxHash),
}

/// One inbound WebSocket text frame, classified by its envelope.
#[derive(Debug, Clone, PartialEq)]
pub enum WsMessage {
    /// Answer to a request we sent.
    Response {
        id: u64,
        result: Result<Value, String>,
    },
    /// Subscription push.
    Notification { subscription: String, result: Value },
}

#[derive(Deserialize)]
struct Envelope {
    id: Option<u64>,
    method: Option<String>,
    params: Option<NotificationParams>,
    result: Option<Value>,
    error: Option<ErrorBody>,
}

#[derive(Deserialize)]
struct NotificationParams {
    subscription: String,
    result: Value,
}

#[derive(Deserialize)]
struct ErrorBody {
    code: i64,
    message: String,
}

fn hex_u64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    let s = String::deserialize(deserializer)?;
    let digits = s
        .strip_prefix("0x")
        .ok_or_else(|| serde::de::Error::custom(format!("quantity '{}' lacks 0x prefix", s)))?;
    u64::from_str_radix(digits, 16).map_err(serde::de::Error::custom)
}

/// Classify a text frame.
pub fn parse_message(text: &str) -> NodeResult<WsMessage> {
    let envelope: Envelope = serde_json::from_str(text)
        .map_err(|e| NodeError::Malformed(format!("invalid JSON-RPC message: {}", e)))?;

    if let Some(id) = envelope.id {
        let result = match (envelope.result, envelope.error) {
            (_, Some(error)) => Err(format!("{} (code {})", error.message, error.code)),
            (Some(result), None) => Ok(result),
            (None, None) => Ok(Value::Null),
        };
        return Ok(WsMessage::Response { id, result });
    }

    match (envelope.method.as_deref(), envelope.params) {
        (Some("eth_subscription"), Some(params)) => Ok(WsMessage::Notification {
            subscription: params.subscription,
            result: params.result,
        }),
        (method, _) => Err(NodeError::Malformed(format!(
            "unexpected message (method {:?})",
            method
        ))),
    }
}

/// Decode the payload of a `newHeads` notification.
pub fn decode_head(result: Value) -> NodeResult<HeadNotice> {
    serde_json::from_value(result)
        .map_err(|e| NodeError::Malformed(format!("invalid block header: {}", e)))
}

/// Decode the payload of a `newPendingTransactions` notification.
pub fn decode_pending_hash(result: Value) -> NodeResult<TxHash> {
    serde_json::from_value(result)
        .map_err(|e| NodeError::Malformed(format!("invalid pending transaction hash: {}", e)))
}

/// A live `newHeads` subscription. Closing consumes it, so the channel is
/// closed at most once.
pub struct HeadSubscription {
    ws: WsStream,
    id: String,
    pending_id: Option<String>,
    /// Notifications that arrived while waiting for a subscribe response.
    backlog: VecDeque<PushNotice>,
}

impl HeadSubscription {
    /// Connect to `url` and subscribe to `newHeads`, all within `connect_timeout`.
    pub async fn connect(url: &str, connect_timeout: Duration) -> NodeResult<Self> {
        match timeout(connect_timeout, Self::connect_inner(url)).await {
            Ok(result) => result,
            Err(_) => Err(NodeError::Timeout(connect_timeout.as_secs())),
        }
    }

    async fn connect_inner(url: &str) -> NodeResult<Self> {
        let (ws, _) = connect_async(url)
            .await
            .map_err(|e| NodeError::Subscription(format!("connect to {} failed: {}", url, e)))?;

        let mut subscription = Self {
            ws,
            id: String::new(),
            pending_id: None,
            backlog: VecDeque::new(),
        };
        subscription.id = subscription.subscribe(HEADS_REQUEST_ID, "newHeads").await?;
        tracing::info!(url, subscription = %subscription.id, "Subscribed to newHeads");
        Ok(subscription)
    }

    /// Also subscribe to `newPendingTransactions` on this connection.
    pub async fn subscribe_pending(&mut self, limit: Duration) -> NodeResult<()> {
        let id = match timeout(limit, self.subscribe(PENDING_REQUEST_ID, "newPendingTransactions")).await {
            Ok(result) => result?,
            Err(_) => return Err(NodeError::Timeout(limit.as_secs())),
        };
        tracing::info!(subscription = %id, "Subscribed to newPendingTransactions");
        self.pending_id = Some(id);
        Ok(())
    }

    /// Send `eth_subscribe` and wait for its response. Notifications for
    /// subscriptions already open are queued, not lost.
    async fn subscribe(&mut self, request_id: u64, topic: &str) -> NodeResult<String> {
        let request = json!({
            "jsonrpc": "2.0",
            "id": request_id,
            "method": "eth_subscribe",
            "params": [topic],
        });
        self.ws
            .send(Message::Text(request.to_string().into()))
            .await
            .map_err(|e| NodeError::Subscription(format!("subscribe to {} failed: {}", topic, e)))?;

        loop {
            let text = match self.ws.next().await {
                Some(Ok(Message::Text(text))) => text,
                Some(Ok(Message::Close(_))) => {
                    return Err(NodeError::Subscription(format!(
                        "node closed the connection during {} subscribe",
                        topic
                    )))
                }
                Some(Ok(_)) => continue,
                Some(Err(e)) => return Err(NodeError::Subscription(e.to_string())),
                None => {
                    return Err(NodeError::Subscription(format!(
                        "connection closed before {} subscription was confirmed",
                        topic
                    )))
                }
            };

            match parse_message(text.as_str()) {
                Ok(WsMessage::Response {
                    id,
                    result: Ok(Value::String(subscription)),
                }) if id == request_id => return Ok(subscription),
                Ok(WsMessage::Response { id, result }) if id == request_id => {
                    return Err(NodeError::Subscription(format!(
                        "eth_subscribe {} refused: {:?}",
                        topic, result
                    )))
                }
                Ok(WsMessage::Notification {
                    subscription,
                    result,
                }) => match self.route(&subscription, result) {
                    Ok(Some(notice)) => self.backlog.push_back(notice),
                    Ok(None) => {}
                    Err(e) => tracing::debug!(error = %e, "Dropping malformed notification"),
                },
                other => tracing::debug!(message = ?other, "Ignoring message during subscribe"),
            }
        }
    }

    /// Match a notification to one of our subscriptions.
    fn route(&self, subscription: &str, result: Value) -> NodeResult<Option<PushNotice>> {
        if subscription == self.id {
            return decode_head(result).map(|head| Some(PushNotice::Head(head)));
        }
        if self.pending_id.as_deref() == Some(subscription) {
            return decode_pending_hash(result).map(|hash| Some(PushNotice::PendingTransaction(hash)));
        }
        Ok(None)
    }

    /// Node-assigned `newHeads` subscription id.
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn watches_pending(&self) -> bool {
        self.pending_id.is_some()
    }

    /// Wait for the next notice. `Ok(None)` means the node closed the channel.
    ///
    /// Cancel-safe: dropping the future between frames loses nothing.
    pub async fn next_notice(&mut self) -> NodeResult<Option<PushNotice>> {
        if let Some(notice) = self.backlog.pop_front() {
            return Ok(Some(notice));
        }

        loop {
            let message = match self.ws.next().await {
                Some(Ok(message)) => message,
                Some(Err(e)) => return Err(NodeError::Subscription(e.to_string())),
                None => return Ok(None),
            };

            let text = match message {
                Message::Text(text) => text,
                Message::Close(_) => return Ok(None),
                _ => continue,
            };

            match parse_message(text.as_str())? {
                WsMessage::Notification {
                    subscription,
                    result,
                } => match self.route(&subscription, result)? {
                    Some(notice) => return Ok(Some(notice)),
                    None => tracing::debug!(%subscription, "Ignoring notification for unknown subscription"),
                },
                other => tracing::debug!(message = ?other, "Ignoring unrelated message"),
            }
        }
    }

    /// Unsubscribe (best effort) and close the connection.
    pub async fn close(mut self) {
        let ids = std::iter::once(self.id.clone()).chain(self.pending_id.clone());
        for (offset, id) in ids.enumerate() {
            let request = json!({
                "jsonrpc": "2.0",
                "id": UNSUBSCRIBE_REQUEST_ID + offset as u64,
                "method": "eth_unsubscribe",
                "params": [id],
            });
            if let Err(e) = self.ws.send(Message::Text(request.to_string().into())).await {
                tracing::debug!(error = %e, "eth_unsubscribe not sent");
            }
        }
        match self.ws.close(None).await {
            Ok(()) => tracing::info!(subscription = %self.id, "Subscription closed"),
            Err(e) => tracing::debug!(error = %e, "Close frame not sent"),
        }
        // Pushes out the reply to a close the node started.
        let _ = self.ws.flush().await;
    }
}

impl std::fmt::Debug for HeadSubscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HeadSubscription")
            .field("id", &self.id)
            .field("pending_id", &self.pending_id)
            .finish()
    }
}
