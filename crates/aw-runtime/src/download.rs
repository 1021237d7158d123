use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Instant;

use aw_config::AccountId;
use aw_core::error::{CoreError, CoreReason, CoreResult};
use aw_core::loader::ReportLoader;
use aw_core::plugin::{DownloadOutcome, PluginBuildCtx};
use aw_core::query::ReportQuery;
use aw_core::report::Report;
use aw_core::retry::{RetryPolicy, run_with_retry};
use aw_core::session::SessionPrototype;
use aw_core::transport::ReportTransport;
use orion_error::prelude::*;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

// ---------------------------------------------------------------------------
// DownloadOrchestrator
// ---------------------------------------------------------------------------

/// Fetches one report per account on a bounded worker pool.
///
/// Each account task derives its session, then fetches and loads the report
/// under the retry policy. A failed account is recorded and never aborts
/// the stage; only cancellation does.
pub struct DownloadOrchestrator {
    threads: usize,
    retry: RetryPolicy,
    transport: Arc<dyn ReportTransport>,
    cancel: CancellationToken,
}

impl DownloadOrchestrator {
    pub fn new(ctx: &PluginBuildCtx) -> Self {
        Self {
            threads: ctx.threads.max(1),
            retry: ctx.retry.clone(),
            transport: Arc::clone(&ctx.transport),
            cancel: ctx.cancel.clone(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub async fn download(
        &self,
        prototype: &SessionPrototype,
        accounts: &[AccountId],
        query: &ReportQuery,
        loader: &ReportLoader,
    ) -> CoreResult<DownloadOutcome> {
        let start = Instant::now();
        let semaphore = Arc::new(Semaphore::new(self.threads));
        let prototype = Arc::new(prototype.clone());
        let query = Arc::new(query.clone());
        let loader = Arc::new(loader.clone());
        let mut pending: BTreeSet<AccountId> = BTreeSet::new();
        let mut join_set = JoinSet::new();

        aw_info!(fetch,
            report_type = %query.report_type,
            accounts = accounts.len(),
            threads = self.threads,
            "downloading reports"
        );
        aw_debug!(fetch, awql = %query.to_awql(), "report query");

        for &account in accounts {
            if !pending.insert(account) {
                continue;
            }
            let semaphore = Arc::clone(&semaphore);
            let job = AccountJob {
                account,
                prototype: Arc::clone(&prototype),
                query: Arc::clone(&query),
                loader: Arc::clone(&loader),
                transport: Arc::clone(&self.transport),
                retry: self.retry.clone(),
                cancel: self.cancel.clone(),
            };
            join_set.spawn(async move {
                let result = match semaphore.acquire().await {
                    Ok(_permit) => job.run().await,
                    Err(_) => Err(CoreError::from(CoreReason::Interrupted)
                        .with_detail("download worker pool closed")),
                };
                (account, result)
            });
        }

        let mut outcome = DownloadOutcome::default();
        loop {
            let next = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    join_set.abort_all();
                    return Err(CoreError::from(CoreReason::Interrupted)
                        .with_detail("report download stage cancelled"));
                }
                next = join_set.join_next() => next,
            };
            match next {
                None => break,
                Some(Ok((account, result))) => {
                    pending.remove(&account);
                    match result {
                        Ok(report) => outcome.reports.push(report),
                        Err(e) => {
                            outcome.failures.insert(account, e.to_string());
                        }
                    }
                }
                Some(Err(e)) => aw_warn!(fetch, error = %e, "download task panicked"),
            }
        }
        for account in pending {
            outcome
                .failures
                .insert(account, "download task panicked".to_string());
        }

        log_tally(&outcome.failures, outcome.reports.len(), start);
        Ok(outcome)
    }
}

fn log_tally(failures: &BTreeMap<AccountId, String>, successes: usize, start: Instant) {
    for (account, reason) in failures {
        aw_error!(fetch, account = %account, reason = %reason, "account failed");
    }
    aw_info!(fetch,
        successes = successes,
        failures = failures.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "report download finished"
    );
}

// ---------------------------------------------------------------------------
// AccountJob: one account's session derivation + fetch + load
// ---------------------------------------------------------------------------

struct AccountJob {
    account: AccountId,
    prototype: Arc<SessionPrototype>,
    query: Arc<ReportQuery>,
    loader: Arc<ReportLoader>,
    transport: Arc<dyn ReportTransport>,
    retry: RetryPolicy,
    cancel: CancellationToken,
}

impl AccountJob {
    async fn run(self) -> CoreResult<Report> {
        let session = self.prototype.for_account(self.account)?;
        let description = format!(
            "download {} for account {}",
            self.query.report_type, self.account
        );

        let account = self.account;
        let session = &session;
        let query = self.query.as_ref();
        let loader = self.loader.as_ref();
        let transport = self.transport.as_ref();
        let report = run_with_retry(&self.retry, &description, &self.cancel, move |attempt| async move {
            aw_debug!(fetch, account = %account, attempt = attempt, "fetching report");
            let raw = transport.fetch(session, query).await?;
            loader.load(account, raw)
        })
        .await?;

        aw_debug!(fetch, account = %account, rows = report.row_count(), "report loaded");
        Ok(report)
    }
}
