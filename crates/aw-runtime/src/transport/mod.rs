//! Report transports shipped with the runtime.

mod local;

use std::sync::Arc;

use aw_config::{AlertingConfig, TransportKind};
use aw_core::transport::ReportTransport;

pub use local::LocalReportTransport;

/// Build the transport selected by `[transport]`.
pub fn build_transport(config: &AlertingConfig) -> Arc<dyn ReportTransport> {
    match config.transport.kind {
        TransportKind::Local => Arc::new(LocalReportTransport::new(config.report_dir_path())),
    }
}
