//! Ethereum node tooling: a signed-transfer submitter and a live
//! block/transaction/balance observer.
//!
//! # Modules
//! - [`blockchain`]: node RPC client, wallet, transfer flow
//! - [`observer`]: block delivery (push or poll) and balance monitoring
//! - [`config`]: TOML configuration with validation
//! - [`lifecycle`]: signal handling and cooperative shutdown
//! - [`observability`]: logging and Prometheus metrics

// Core subsystems
pub mod blockchain;
pub mod observer;

// Cross-cutting concerns
pub mod config;
pub mod lifecycle;
pub mod observability;

pub use blockchain::{NodeClient, NodeError, TransferSubmitter, Wallet};
pub use config::AppConfig;
pub use lifecycle::Shutdown;
