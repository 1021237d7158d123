use std::path::Path;

use aw_config::{AccountId, AlertingConfig, AlertsFile};
use aw_core::error::CoreReason;
use aw_core::plugin::{PluginBuildCtx, PluginRegistry};
use aw_core::retry::RetryPolicy;
use aw_core::session::SessionPrototype;
use orion_error::op_context;
use orion_error::prelude::*;
use orion_error::ErrorOweBase;
use tokio_util::sync::CancellationToken;

use crate::error::{RuntimeReason, RuntimeResult};
use crate::plugins::builtin_registry;
use crate::processor::{AlertProcessor, RunSummary};
use crate::transport::build_transport;

/// Everything a run needs, loaded and validated from the settings file.
pub struct RunPlan {
    pub alerts: AlertsFile,
    pub accounts: Vec<AccountId>,
    pub processor: AlertProcessor,
}

impl RunPlan {
    /// Load alerts and accounts and wire the processor with the built-in
    /// plugins. `accounts_override` replaces the configured accounts file.
    pub fn bootstrap(config: &AlertingConfig, accounts_override: Option<&Path>) -> RuntimeResult<Self> {
        Self::bootstrap_with(config, accounts_override, builtin_registry())
    }

    /// Like [`RunPlan::bootstrap`] with a caller-supplied registry.
    pub fn bootstrap_with(
        config: &AlertingConfig,
        accounts_override: Option<&Path>,
        registry: PluginRegistry,
    ) -> RuntimeResult<Self> {
        let mut op = op_context!("alerting-bootstrap").with_auto_log();
        let alerts_path = config.alerts_path();
        op.record("alerts_file", alerts_path.display().to_string().as_str());

        let alerts = AlertsFile::load(&alerts_path).owe(config_load())?;
        for name in alerts.duplicate_names() {
            aw_warn!(conf, alert = %name, "alert name used more than once");
        }

        let accounts = config
            .load_accounts(accounts_override)
            .owe(config_load())?;
        if config.processor.threads == 0 {
            aw_warn!(conf,
                threads = config.processor.effective_threads(),
                "processor.threads is 0, using the default pool size"
            );
        }

        let session = SessionPrototype::from_config(&config.session).err_conv()?;
        let ctx = PluginBuildCtx::new(build_transport(config), config.work_root_path())
            .with_threads(config.processor.effective_threads())
            .with_retry(RetryPolicy::from(&config.retry))
            .with_cancel(CancellationToken::new());

        aw_info!(conf,
            alerts_file = %alerts_path.display(),
            alerts = alerts.alerts.len(),
            accounts = accounts.len(),
            "configuration loaded"
        );
        op.mark_suc();
        Ok(Self {
            alerts,
            accounts,
            processor: AlertProcessor::new(registry, ctx, session),
        })
    }

    pub fn cancel_token(&self) -> CancellationToken {
        self.processor.cancel_token()
    }

    pub async fn run(&self) -> RuntimeResult<RunSummary> {
        self.processor.run(&self.accounts, &self.alerts.alerts).await
    }
}

fn config_load() -> RuntimeReason {
    RuntimeReason::Core(CoreReason::ConfigLoad)
}
