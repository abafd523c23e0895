//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! wallet / ledger / orchestrator / view produce:
//!     → logging.rs (structured tracing events, tx id + hash fields)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → stderr log stream
//!     → Prometheus scrape endpoint (optional)
//! ```

pub mod logging;
pub mod metrics;

pub use logging::init_logging;
