//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for both tools.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration shared by the observer and the transfer submitter.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Node endpoints and per-request timeouts.
    pub node: NodeConfig,

    /// Transfer submitter settings.
    pub transfer: TransferConfig,

    /// Block observer and balance monitor settings.
    pub observer: ObserverConfig,

    /// Logging and metrics settings.
    pub observability: ObservabilityConfig,
}

/// Node connection configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NodeConfig {
    /// JSON-RPC HTTP endpoint URL.
    pub http_url: String,

    /// WebSocket endpoint URL for push subscriptions. Empty disables push.
    pub ws_url: String,

    /// Chain ID (1337 for the local dev node).
    pub chain_id: u64,

    /// RPC request timeout in seconds.
    pub rpc_timeout_secs: u64,

    /// WebSocket connect + subscribe timeout in seconds.
    pub ws_connect_timeout_secs: u64,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            http_url: "http://localhost:8545".to_string(),
            ws_url: "ws://localhost:8546".to_string(),
            chain_id: 1337,
            rpc_timeout_secs: 10,
            ws_connect_timeout_secs: 5,
        }
    }
}

/// Transfer submitter configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TransferConfig {
    /// Environment variable holding the sender's private key.
    pub private_key_env: String,

    /// Destination address.
    pub to_address: String,

    /// Amount to send, in ether (decimal string, e.g. "2.5").
    pub amount_eth: String,

    /// Gas limit (21000 is the minimum for a plain transfer).
    pub gas_limit: u64,

    /// Fixed gas price in gwei. `None` uses the node's current gas price.
    pub gas_price_gwei: Option<u64>,

    /// Maximum time to wait for a receipt, in seconds. 0 waits forever.
    pub receipt_timeout_secs: u64,

    /// Receipt polling interval in milliseconds.
    pub receipt_poll_interval_ms: u64,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            private_key_env: "NODE_PULSE_PRIVATE_KEY".to_string(),
            to_address: "0x2B5AD5c4795c026514f8317c7a215E218DcCD6cF".to_string(),
            amount_eth: "2.5".to_string(),
            gas_limit: 21_000,
            gas_price_gwei: Some(20),
            receipt_timeout_secs: 120,
            receipt_poll_interval_ms: 1_000,
        }
    }
}

/// Observer configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObserverConfig {
    /// Accounts whose transactions and balances are reported.
    pub watched_accounts: Vec<String>,

    /// Try the WebSocket subscription before falling back to polling.
    pub use_push: bool,

    /// Also report pending transactions while push delivery is active.
    pub watch_pending: bool,

    /// Head polling interval in seconds (poll mode).
    pub poll_interval_secs: u64,

    /// Delay after a failed poll before retrying, in seconds.
    pub error_backoff_secs: u64,

    /// Balance re-read interval in seconds.
    pub balance_interval_secs: u64,
}

impl Default for ObserverConfig {
    fn default() -> Self {
        Self {
            watched_accounts: vec![
                "0x2c7536E3605D9C16a7a3D7b1898e529396a65c23".to_string(),
                "0x3C44CdDdB6a900fa2b585dd299e03d12FA4293BC".to_string(),
                "0x90F79bf6EB2c4f870365E785982E1f101E93b906".to_string(),
            ],
            use_push: true,
            watch_pending: true,
            poll_interval_secs: 2,
            error_backoff_secs: 5,
            balance_interval_secs: 10,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Default log filter when `RUST_LOG` is not set.
    pub log_level: String,

    /// Prometheus exporter bind address (e.g. "127.0.0.1:9100"). Disabled when unset.
    pub metrics_address: Option<String>,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "node_pulse=info".to_string(),
            metrics_address: None,
        }
    }
}
