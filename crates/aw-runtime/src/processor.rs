use std::sync::Arc;
use std::time::{Duration, Instant};

use aw_config::{AccountId, AlertDefinition};
use aw_core::error::{CoreError, CoreReason, CoreResult};
use aw_core::plugin::{NamedAction, PluginBuildCtx, PluginRegistry, ReportDownloader, RuleChain};
use aw_core::report::{Report, ReportSet};
use aw_core::session::SessionPrototype;
use aw_core::template::MessageTemplate;
use orion_error::prelude::*;
use tokio_util::sync::CancellationToken;

use crate::action_engine::ActionEngine;
use crate::error::{RuntimeResult, alert_failure};
use crate::rule_engine::RuleEngine;

/// What one alert produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlertSummary {
    pub name: String,
    /// Reports handed to the actions.
    pub reports: usize,
    /// Alert rows across those reports.
    pub rows: usize,
    pub download_failures: usize,
    pub failed_actions: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub alerts: Vec<AlertSummary>,
    pub elapsed: Duration,
}

impl RunSummary {
    pub fn total_rows(&self) -> usize {
        self.alerts.iter().map(|a| a.rows).sum()
    }
}

/// An alert whose plugins are constructed and ready to run.
struct PreparedAlert {
    name: String,
    downloader: Box<dyn ReportDownloader>,
    rules: RuleChain,
    template: MessageTemplate,
    actions: Vec<NamedAction>,
}

// ---------------------------------------------------------------------------
// AlertProcessor
// ---------------------------------------------------------------------------

/// Runs configured alerts one after another: download, rules, actions.
///
/// Every alert's plugins are constructed before the first stage starts, so
/// a configuration error never leaves a run half done.
pub struct AlertProcessor {
    registry: PluginRegistry,
    ctx: PluginBuildCtx,
    session: SessionPrototype,
}

impl AlertProcessor {
    pub fn new(registry: PluginRegistry, ctx: PluginBuildCtx, session: SessionPrototype) -> Self {
        Self {
            registry,
            ctx,
            session,
        }
    }

    /// Token that aborts the run when cancelled.
    pub fn cancel_token(&self) -> CancellationToken {
        self.ctx.cancel.clone()
    }

    pub fn threads(&self) -> usize {
        self.ctx.threads
    }

    pub async fn run(&self, accounts: &[AccountId], alerts: &[AlertDefinition]) -> RuntimeResult<RunSummary> {
        let start = Instant::now();
        aw_info!(sys,
            alerts = alerts.len(),
            accounts = accounts.len(),
            threads = self.ctx.threads,
            "alert run starting"
        );

        let prepared = alerts
            .iter()
            .map(|alert| {
                self.prepare(alert)
                    .map_err(|e| alert_failure(&alert.name, e))
            })
            .collect::<RuntimeResult<Vec<_>>>()?;

        let mut summary = RunSummary::default();
        for (idx, alert) in prepared.into_iter().enumerate() {
            if self.ctx.cancel.is_cancelled() {
                let err = CoreError::from(CoreReason::Interrupted).with_detail("alert run cancelled");
                return Err(err).err_conv();
            }
            aw_info!(sys,
                alert = idx + 1,
                name = %alert.name,
                accounts = accounts.len(),
                "processing alert"
            );
            let name = alert.name.clone();
            let alert_summary = self.process(alert, accounts).await.map_err(|e| {
                let err = alert_failure(&name, e);
                aw_error!(sys, alert = %name, error = %err, "alert failed");
                err
            })?;
            summary.alerts.push(alert_summary);
        }

        summary.elapsed = start.elapsed();
        aw_info!(sys,
            alerts = summary.alerts.len(),
            rows = summary.total_rows(),
            elapsed_ms = summary.elapsed.as_millis() as u64,
            "alert run finished"
        );
        Ok(summary)
    }

    fn prepare(&self, alert: &AlertDefinition) -> CoreResult<PreparedAlert> {
        let prepared = PreparedAlert {
            name: alert.name.clone(),
            downloader: self.registry.build_downloader(&alert.downloader, &self.ctx)?,
            rules: self.registry.build_rule_chain(&alert.rules, &self.ctx)?,
            template: MessageTemplate::parse(&alert.message)?,
            actions: self.registry.build_actions(&alert.actions, &self.ctx)?,
        };
        aw_debug!(conf,
            alert = %alert.name,
            downloader = %alert.downloader.type_name,
            rules = prepared.rules.len(),
            actions = prepared.actions.len(),
            "alert plugins constructed"
        );
        Ok(prepared)
    }

    async fn process(&self, alert: PreparedAlert, accounts: &[AccountId]) -> CoreResult<AlertSummary> {
        let mut summary = AlertSummary {
            name: alert.name.clone(),
            ..AlertSummary::default()
        };

        let outcome = alert.downloader.download_reports(&self.session, accounts).await?;
        summary.download_failures = outcome.failures.len();
        if outcome.reports.is_empty() {
            aw_info!(sys, alert = %alert.name, "no reports downloaded, skipping rules and actions");
            return Ok(summary);
        }
        dump_reports("downloaded report", &outcome.reports);

        let reports = RuleEngine::new(self.ctx.threads, self.ctx.cancel.clone())
            .apply(Arc::new(alert.rules), Arc::new(alert.template), outcome.reports)
            .await?;
        dump_reports("processed report", &reports);

        let reports = ReportSet::new(reports);
        summary.reports = reports.len();
        summary.rows = reports.total_rows();

        let outcome = ActionEngine::new(self.ctx.threads, self.ctx.cancel.clone())
            .dispatch(alert.actions, reports)
            .await?;
        summary.failed_actions = outcome.failed.into_iter().map(|(name, _)| name).collect();
        Ok(summary)
    }
}

fn dump_reports(label: &str, reports: &[Report]) {
    if !tracing::enabled!(tracing::Level::DEBUG) {
        return;
    }
    for report in reports {
        aw_debug!(sys, account = %report.account_id(), "{label}:\n{report}");
    }
}
