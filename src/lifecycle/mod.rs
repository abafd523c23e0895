//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Signals (signals.rs):
//!     SIGINT → Shutdown::trigger
//!
//! Shutdown (shutdown.rs):
//!     trigger → every orchestrator wait returns Abandoned → refresh skipped
//! ```

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
pub use signals::spawn_ctrl_c_handler;
