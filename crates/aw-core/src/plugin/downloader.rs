use std::collections::BTreeMap;

use async_trait::async_trait;
use aw_config::AccountId;

use crate::error::CoreResult;
use crate::report::Report;
use crate::session::SessionPrototype;

/// Reports fetched for one alert, plus the accounts that could not be
/// fetched and why.
#[derive(Debug, Default)]
pub struct DownloadOutcome {
    pub reports: Vec<Report>,
    pub failures: BTreeMap<AccountId, String>,
}

impl DownloadOutcome {
    pub fn from_reports(reports: Vec<Report>) -> Self {
        Self {
            reports,
            failures: BTreeMap::new(),
        }
    }
}

/// Produces the reports an alert works on.
///
/// Per-account failures belong in [`DownloadOutcome::failures`]; an `Err`
/// aborts the run.
#[async_trait]
pub trait ReportDownloader: Send + Sync {
    async fn download_reports(
        &self,
        session: &SessionPrototype,
        accounts: &[AccountId],
    ) -> CoreResult<DownloadOutcome>;
}
