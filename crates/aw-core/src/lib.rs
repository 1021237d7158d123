pub mod date_range;
pub mod error;
pub mod loader;
pub mod money;
pub mod plugin;
pub mod query;
pub mod report;
pub mod retry;
pub mod session;
pub mod template;
pub mod transport;

pub use error::{CoreError, CoreReason, CoreResult, FailureKind};
pub use report::{ALERT_MESSAGE_COLUMN, Report, ReportSet, RowMut, RowView};
