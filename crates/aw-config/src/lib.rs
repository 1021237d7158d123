pub mod accounts;
pub mod alert;
pub mod alerting;
pub mod logging;
pub mod processor;
pub mod retry;
pub mod session;
pub mod transport;
pub mod types;
mod validate;

pub use accounts::{AccountId, load_account_ids, merge_account_ids, parse_account_ids};
pub use alert::{AlertDefinition, AlertsFile, PluginSpec};
pub use alerting::AlertingConfig;
pub use logging::{LogFormat, LoggingConfig};
pub use processor::{DEFAULT_THREADS, ProcessorConfig};
pub use retry::RetryConfig;
pub use session::SessionConfig;
pub use transport::{TransportConfig, TransportKind};
pub use types::HumanDuration;
