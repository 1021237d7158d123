//! Extension points (downloader, rule, action) and the registry that builds
//! them from configured type names.

mod action;
mod downloader;
mod registry;
mod rule;

use std::path::PathBuf;
use std::sync::Arc;

use aw_config::PluginSpec;
use orion_error::prelude::*;
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;

use crate::error::{CoreError, CoreReason, CoreResult};
use crate::retry::RetryPolicy;
use crate::transport::ReportTransport;

pub use action::{AlertAction, NamedAction};
pub use downloader::{DownloadOutcome, ReportDownloader};
pub use registry::{
    ActionFactory, DownloaderFactory, PluginKind, PluginRegistry, RuleFactory,
};
pub use rule::{AlertRule, RuleChain, RuleSlot};

/// Run-wide context handed to every plugin factory.
#[derive(Clone)]
pub struct PluginBuildCtx {
    /// Shared worker-pool size.
    pub threads: usize,
    pub retry: RetryPolicy,
    pub transport: Arc<dyn ReportTransport>,
    /// Base directory for plugin-relative paths (log files, ...).
    pub work_root: PathBuf,
    pub cancel: CancellationToken,
}

impl PluginBuildCtx {
    pub fn new(transport: Arc<dyn ReportTransport>, work_root: impl Into<PathBuf>) -> Self {
        Self {
            threads: aw_config::DEFAULT_THREADS,
            retry: RetryPolicy::default(),
            transport,
            work_root: work_root.into(),
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads.max(1);
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }
}

impl std::fmt::Debug for PluginBuildCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginBuildCtx")
            .field("threads", &self.threads)
            .field("retry", &self.retry)
            .field("work_root", &self.work_root)
            .finish_non_exhaustive()
    }
}

/// Deserialize a plugin's parameter object into its typed settings.
/// Failures are `ConfigLoad` naming the plugin type.
pub fn plugin_params<T: DeserializeOwned>(spec: &PluginSpec) -> CoreResult<T> {
    serde_json::from_value(spec.params_value()).map_err(|e| {
        CoreError::from(CoreReason::ConfigLoad)
            .with_detail(format!("invalid parameters for {}: {e}", spec.type_name))
    })
}
