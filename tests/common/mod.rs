//! Shared mock nodes for integration testing.
//!
//! - [`start_rpc_node`]: HTTP JSON-RPC over a raw TCP listener; answers are
//!   produced by a closure keyed on the method name.
//! - [`start_ws_node`]: WebSocket endpoint speaking `eth_subscribe`, pushing
//!   scripted `newHeads` (and `newPendingTransactions`) notifications and
//!   counting close frames.

#![allow(dead_code)]

use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;

pub const SUBSCRIPTION_ID: &str = "0x9cef478923ff08bf67fde6c64013158d";
pub const PENDING_SUBSCRIPTION_ID: &str = "0x4a8a4c0517381924f9838102c5a4dcb7";

/// Format a number as a JSON-RPC quantity.
pub fn quantity(n: u64) -> Value {
    Value::String(format!("{:#x}", n))
}

/// Start an HTTP JSON-RPC node on an ephemeral port.
///
/// `handler(method, params)` returns the `result`, or an error message sent
/// back as a JSON-RPC error object.
pub async fn start_rpc_node<F>(handler: F) -> SocketAddr
where
    F: Fn(&str, &Value) -> Result<Value, String> + Send + Sync + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handler = Arc::new(handler);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let handler = handler.clone();
                    tokio::spawn(async move {
                        let Some(body) = read_http_body(&mut socket).await else {
                            return;
                        };
                        let Ok(request) = serde_json::from_slice::<Value>(&body) else {
                            return;
                        };

                        let method = request["method"].as_str().unwrap_or_default();
                        let reply = match handler(method, &request["params"]) {
                            Ok(result) => json!({
                                "jsonrpc": "2.0",
                                "id": request["id"],
                                "result": result,
                            }),
                            Err(message) => json!({
                                "jsonrpc": "2.0",
                                "id": request["id"],
                                "error": { "code": -32000, "message": message },
                            }),
                        };
                        let body = reply.to_string();

                        let response = format!(
                            "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

async fn read_http_body(socket: &mut TcpStream) -> Option<Vec<u8>> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let header_end = loop {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let headers = String::from_utf8_lossy(&buf[..header_end]).to_ascii_lowercase();
    let length = headers
        .lines()
        .find_map(|line| line.strip_prefix("content-length:"))
        .and_then(|value| value.trim().parse::<usize>().ok())
        .unwrap_or(0);

    while buf.len() < header_end + length {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    Some(buf[header_end..header_end + length].to_vec())
}

/// A header-complete empty block, as a node returns it.
pub fn empty_block_json(number: u64) -> Value {
    json!({
        "hash": format!("0x{:064x}", number + 0xb10c),
        "parentHash": format!("0x{:064x}", number + 0xb10b),
        "sha3Uncles": "0x1dcc4de8dec75d7aab85b567b6ccd41ad312451b948a7413f0a142fd40d49347",
        "miner": "0x0000000000000000000000000000000000000000",
        "stateRoot": format!("0x{:064x}", 1),
        "transactionsRoot": "0x56e81f171bcc55a6ff8345e692c0f86e5b48e01b996cadc001622fb5e363b421",
        "receiptsRoot": "0x56e81f171bcc55a6ff8345e692c0f86e5b48e01b996cadc001622fb5e363b421",
        "logsBloom": format!("0x{}", "0".repeat(512)),
        "difficulty": "0x0",
        "number": quantity(number),
        "gasLimit": quantity(30_000_000),
        "gasUsed": "0x0",
        "timestamp": quantity(1_700_000_000 + number),
        "extraData": "0x",
        "mixHash": format!("0x{:064x}", 0),
        "nonce": "0x0000000000000000",
        "baseFeePerGas": quantity(1_000_000_000),
        "totalDifficulty": "0x0",
        "size": "0x220",
        "uncles": [],
        "transactions": [],
    })
}

/// Handle on a running mock WebSocket node.
#[derive(Clone)]
pub struct MockWsNode {
    pub addr: SocketAddr,
    closes: Arc<AtomicUsize>,
    unsubscribes: Arc<AtomicUsize>,
}

impl MockWsNode {
    pub fn url(&self) -> String {
        format!("ws://{}", self.addr)
    }

    /// Close frames received from clients.
    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    pub fn unsubscribes(&self) -> usize {
        self.unsubscribes.load(Ordering::SeqCst)
    }

    /// Wait up to `limit` for at least `count` close frames.
    pub async fn wait_for_closes(&self, count: usize, limit: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + limit;
        while tokio::time::Instant::now() < deadline {
            if self.closes() >= count {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        self.closes() >= count
    }
}

/// What a mock WebSocket node does once a client subscribes.
#[derive(Clone, Default)]
struct WsScript {
    heads: Vec<u64>,
    pending: Vec<String>,
    refuse: bool,
    /// Send an unparseable frame before the heads, and close after them.
    flaky: bool,
}

/// Start a WebSocket node that accepts `eth_subscribe` and pushes one
/// `newHeads` notification per entry in `heads`.
pub async fn start_ws_node(heads: Vec<u64>) -> MockWsNode {
    start_ws(WsScript {
        heads,
        ..WsScript::default()
    })
    .await
}

/// Like [`start_ws_node`], also announcing `pending` transaction hashes once
/// `newPendingTransactions` is subscribed.
pub async fn start_ws_node_with_pending(heads: Vec<u64>, pending: Vec<String>) -> MockWsNode {
    start_ws(WsScript {
        heads,
        pending,
        ..WsScript::default()
    })
    .await
}

/// Start a WebSocket node that sends a garbage frame, then the `heads`, then
/// closes the connection itself.
pub async fn start_flaky_ws_node(heads: Vec<u64>) -> MockWsNode {
    start_ws(WsScript {
        heads,
        flaky: true,
        ..WsScript::default()
    })
    .await
}

/// Start a WebSocket node that answers `eth_subscribe` with an error.
pub async fn start_refusing_ws_node() -> MockWsNode {
    start_ws(WsScript {
        refuse: true,
        ..WsScript::default()
    })
    .await
}

async fn start_ws(script: WsScript) -> MockWsNode {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let node = MockWsNode {
        addr: listener.local_addr().unwrap(),
        closes: Arc::new(AtomicUsize::new(0)),
        unsubscribes: Arc::new(AtomicUsize::new(0)),
    };

    let handle = node.clone();
    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            let node = handle.clone();
            let script = script.clone();
            tokio::spawn(async move {
                let Ok(mut ws) = accept_async(stream).await else {
                    return;
                };

                while let Some(Ok(message)) = ws.next().await {
                    match message {
                        Message::Text(text) => {
                            let request: Value = match serde_json::from_str(text.as_str()) {
                                Ok(value) => value,
                                Err(_) => continue,
                            };
                            match request["method"].as_str() {
                                Some("eth_subscribe") if script.refuse => {
                                    let reply = json!({
                                        "jsonrpc": "2.0",
                                        "id": request["id"],
                                        "error": { "code": -32601, "message": "subscriptions not supported" },
                                    });
                                    let _ = ws.send(Message::Text(reply.to_string().into())).await;
                                }
                                Some("eth_subscribe") if request["params"][0] == "newPendingTransactions" => {
                                    let reply = json!({
                                        "jsonrpc": "2.0",
                                        "id": request["id"],
                                        "result": PENDING_SUBSCRIPTION_ID,
                                    });
                                    let _ = ws.send(Message::Text(reply.to_string().into())).await;
                                    for hash in &script.pending {
                                        let _ = ws
                                            .send(Message::Text(pending_notification(hash).to_string().into()))
                                            .await;
                                    }
                                }
                                Some("eth_subscribe") => {
                                    let reply = json!({
                                        "jsonrpc": "2.0",
                                        "id": request["id"],
                                        "result": SUBSCRIPTION_ID,
                                    });
                                    let _ = ws.send(Message::Text(reply.to_string().into())).await;
                                    if script.flaky {
                                        let _ = ws.send(Message::Text("{not json".into())).await;
                                    }
                                    for number in &script.heads {
                                        let _ = ws
                                            .send(Message::Text(head_notification(*number).to_string().into()))
                                            .await;
                                    }
                                    if script.flaky {
                                        let _ = ws.close(None).await;
                                    }
                                }
                                Some("eth_unsubscribe") => {
                                    node.unsubscribes.fetch_add(1, Ordering::SeqCst);
                                    let reply = json!({
                                        "jsonrpc": "2.0",
                                        "id": request["id"],
                                        "result": true,
                                    });
                                    let _ = ws.send(Message::Text(reply.to_string().into())).await;
                                }
                                _ => {}
                            }
                        }
                        Message::Close(_) => {
                            node.closes.fetch_add(1, Ordering::SeqCst);
                        }
                        _ => {}
                    }
                }
            });
        }
    });

    node
}

fn pending_notification(hash: &str) -> Value {
    json!({
        "jsonrpc": "2.0",
        "method": "eth_subscription",
        "params": {
            "subscription": PENDING_SUBSCRIPTION_ID,
            "result": hash,
        },
    })
}

fn head_notification(number: u64) -> Value {
    json!({
        "jsonrpc": "2.0",
        "method": "eth_subscription",
        "params": {
            "subscription": SUBSCRIPTION_ID,
            "result": {
                "number": quantity(number),
                "hash": format!("0x{:064x}", number + 0xb10c),
                "timestamp": quantity(1_700_000_000 + number),
                "parentHash": format!("0x{:064x}", number + 0xb10b),
                "gasUsed": "0x0",
            },
        },
    })
}
