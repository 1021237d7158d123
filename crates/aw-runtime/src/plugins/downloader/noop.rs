use async_trait::async_trait;
use aw_config::AccountId;
use aw_core::error::CoreResult;
use aw_core::plugin::{DownloadOutcome, ReportDownloader};
use aw_core::session::SessionPrototype;

/// Downloads nothing; useful to dry-run an alert's configuration.
#[derive(Debug, Default)]
pub struct NoOpAlertReportDownloader;

#[async_trait]
impl ReportDownloader for NoOpAlertReportDownloader {
    async fn download_reports(
        &self,
        _session: &SessionPrototype,
        _accounts: &[AccountId],
    ) -> CoreResult<DownloadOutcome> {
        Ok(DownloadOutcome::default())
    }
}
