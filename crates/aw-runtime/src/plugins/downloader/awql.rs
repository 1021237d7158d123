use async_trait::async_trait;
use aw_config::{AccountId, PluginSpec};
use aw_core::error::{CoreError, CoreReason, CoreResult, FailureKind};
use aw_core::loader::{FieldsMapping, ReportLoader};
use aw_core::plugin::{DownloadOutcome, PluginBuildCtx, ReportDownloader, plugin_params};
use aw_core::query::ReportQuery;
use aw_core::session::SessionPrototype;
use orion_error::prelude::*;
use serde::Deserialize;

use crate::download::DownloadOrchestrator;

#[derive(Debug, Clone, Deserialize)]
pub struct AwqlDownloaderParams {
    #[serde(rename = "ReportQuery")]
    pub query: ReportQuery,
    /// Display header name → field name. Without it the exported header is
    /// taken as the field names.
    #[serde(rename = "FieldsMapping", default)]
    pub fields_mapping: Option<FieldsMapping>,
    /// Failure kinds (`Session`, `Transport`, ...) never retried for this
    /// alert, on top of the run-wide ones.
    #[serde(rename = "NonRetriable", default)]
    pub non_retriable: Vec<String>,
}

impl AwqlDownloaderParams {
    fn non_retriable_kinds(&self) -> CoreResult<Vec<FailureKind>> {
        self.non_retriable
            .iter()
            .map(|name| {
                FailureKind::from_name(name).ok_or_else(|| {
                    CoreError::from(CoreReason::ConfigLoad)
                        .with_detail(format!("NonRetriable: unknown failure kind {name:?}"))
                })
            })
            .collect()
    }
}

/// Downloads one report per account through the configured transport.
pub struct AwqlReportDownloader {
    query: ReportQuery,
    loader: ReportLoader,
    orchestrator: DownloadOrchestrator,
}

impl AwqlReportDownloader {
    pub fn from_spec(spec: &PluginSpec, ctx: &PluginBuildCtx) -> CoreResult<Self> {
        let params: AwqlDownloaderParams = plugin_params(spec)?;
        Self::new(params, ctx)
    }

    pub fn new(params: AwqlDownloaderParams, ctx: &PluginBuildCtx) -> CoreResult<Self> {
        params.query.validate()?;
        let mut non_retriable = ctx.retry.non_retriable.clone();
        for kind in params.non_retriable_kinds()? {
            if !non_retriable.contains(&kind) {
                non_retriable.push(kind);
            }
        }
        let retry = ctx.retry.clone().with_non_retriable(non_retriable);
        let loader = ReportLoader::new(params.query.report_type.clone(), params.fields_mapping);
        Ok(Self {
            query: params.query,
            loader,
            orchestrator: DownloadOrchestrator::new(ctx).with_retry(retry),
        })
    }

    pub fn query(&self) -> &ReportQuery {
        &self.query
    }
}

#[async_trait]
impl ReportDownloader for AwqlReportDownloader {
    async fn download_reports(
        &self,
        session: &SessionPrototype,
        accounts: &[AccountId],
    ) -> CoreResult<DownloadOutcome> {
        self.orchestrator
            .download(session, accounts, &self.query, &self.loader)
            .await
    }
}
