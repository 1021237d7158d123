#[macro_use]
mod log_macros;

pub mod action_engine;
pub mod bootstrap;
pub mod download;
pub mod error;
pub mod plugins;
pub mod processor;
pub mod rule_engine;
pub mod signal;
pub mod tracing_init;
pub mod transport;

pub use bootstrap::RunPlan;
pub use error::{RuntimeError, RuntimeReason, RuntimeResult};
pub use processor::{AlertProcessor, AlertSummary, RunSummary};
