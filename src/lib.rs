//! EHR dApp contract-interaction library

pub mod app;
pub mod config;
pub mod contract;
pub mod deploy;
pub mod error;
pub mod ledger;
pub mod lifecycle;
pub mod observability;
pub mod orchestrator;
pub mod resilience;
pub mod view;
pub mod wallet;

pub use app::EhrApp;
pub use config::schema::EhrConfig;
pub use error::EhrError;
pub use lifecycle::Shutdown;
