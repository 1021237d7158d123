use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use aw_core::error::{CoreError, CoreReason, CoreResult, FailureKind};
use aw_core::plugin::{AlertAction, NamedAction};
use aw_core::report::ReportSet;
use orion_error::prelude::*;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

/// Which actions of one dispatch completed, and why the others did not.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ActionOutcome {
    pub succeeded: Vec<String>,
    /// `(action type name, error message)` in action order.
    pub failed: Vec<(String, String)>,
}

// ---------------------------------------------------------------------------
// ActionEngine
// ---------------------------------------------------------------------------

/// Runs every action of an alert over the same frozen report set, one task
/// per action on a bounded pool.
///
/// A failing or panicking action is logged and recorded; its siblings keep
/// running. Only cancellation aborts the stage.
pub struct ActionEngine {
    threads: usize,
    cancel: CancellationToken,
}

impl ActionEngine {
    pub fn new(threads: usize, cancel: CancellationToken) -> Self {
        Self {
            threads: threads.max(1),
            cancel,
        }
    }

    pub async fn dispatch(&self, actions: Vec<NamedAction>, reports: ReportSet) -> CoreResult<ActionOutcome> {
        let start = Instant::now();
        let action_count = actions.len();
        let semaphore = Arc::new(Semaphore::new(self.threads));
        let mut pending: BTreeMap<usize, String> = BTreeMap::new();
        let mut join_set = JoinSet::new();

        for (idx, NamedAction { name, action }) in actions.into_iter().enumerate() {
            pending.insert(idx, name.clone());
            let semaphore = Arc::clone(&semaphore);
            let reports = reports.clone();
            join_set.spawn(async move {
                let result = match semaphore.acquire().await {
                    Ok(_permit) => run_action(action, &reports).await,
                    Err(_) => Err(CoreError::from(CoreReason::Interrupted)
                        .with_detail("action worker pool closed")),
                };
                (idx, result)
            });
        }

        let mut results: BTreeMap<usize, Result<usize, String>> = BTreeMap::new();
        loop {
            let next = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    join_set.abort_all();
                    return Err(CoreError::from(CoreReason::Interrupted)
                        .with_detail("action stage cancelled"));
                }
                next = join_set.join_next() => next,
            };
            match next {
                None => break,
                Some(Ok((idx, result))) => {
                    results.insert(idx, result.map_err(|e| e.to_string()));
                }
                Some(Err(e)) => aw_warn!(action, error = %e, "action task panicked"),
            }
        }

        let mut outcome = ActionOutcome::default();
        for (idx, name) in pending {
            match results.remove(&idx) {
                Some(Ok(rows)) => {
                    aw_debug!(action, action = %name, rows = rows, "action finished");
                    outcome.succeeded.push(name);
                }
                Some(Err(reason)) => {
                    aw_error!(action, action = %name, error = %reason, "error running alert action");
                    outcome.failed.push((name, reason));
                }
                None => {
                    aw_error!(action, action = %name, "alert action panicked");
                    outcome.failed.push((name, "action task panicked".to_string()));
                }
            }
        }

        aw_info!(action,
            actions = action_count,
            reports = reports.len(),
            failed = outcome.failed.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "actions processed"
        );
        Ok(outcome)
    }
}

/// `initialize`, every row of every report, then `finalize`. The first
/// error ends the action; `finalize` is not called after a failure.
async fn run_action(mut action: Box<dyn AlertAction>, reports: &ReportSet) -> CoreResult<usize> {
    action.initialize().await.map_err(|e| action_failed("initialize", e))?;
    let mut rows = 0;
    for report in reports.iter() {
        for row in report.row_views() {
            action
                .process_entry(&row)
                .await
                .map_err(|e| action_failed("process_entry", e))?;
            rows += 1;
        }
    }
    action.finalize().await.map_err(|e| action_failed("finalize", e))?;
    Ok(rows)
}

fn action_failed(hook: &str, err: CoreError) -> CoreError {
    if err.reason().failure_kind() == Some(FailureKind::Action) {
        return err;
    }
    CoreError::from(CoreReason::Processing(FailureKind::Action))
        .with_detail(format!("{hook} failed: {err}"))
}
