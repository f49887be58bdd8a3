//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events on stderr)
//!     → metrics.rs (counters, gauges)
//!
//! Consumers:
//!     → Terminal / log aggregation
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```
//!
//! # Design Decisions
//! - Logs go to stderr; stdout is reserved for the observer's console events
//! - Metrics are no-ops until an exporter is installed

pub mod logging;
pub mod metrics;
