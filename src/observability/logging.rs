//! Structured logging.
//!
//! `RUST_LOG` wins when set; otherwise the configured level applies to
//! this crate and everything else logs at `warn`. Logs go to stderr so
//! command output on stdout stays machine-readable.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::ObservabilityConfig;

/// Filter directive used when `RUST_LOG` is unset.
pub fn default_directive(config: &ObservabilityConfig) -> String {
    format!("warn,ehr_dapp={}", config.log_level)
}

/// Initialize the global tracing subscriber. Later calls are no-ops.
pub fn init_logging(config: &ObservabilityConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(config)));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}
