use std::sync::Arc;
use std::time::Instant;

use aw_core::error::{CoreError, CoreReason, CoreResult, FailureKind};
use aw_core::plugin::{RuleChain, RuleSlot};
use aw_core::report::{ALERT_MESSAGE_COLUMN, Report};
use aw_core::template::MessageTemplate;
use orion_error::prelude::*;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

// ---------------------------------------------------------------------------
// RuleEngine
// ---------------------------------------------------------------------------

/// Applies an alert's rule chain to every report, one blocking task per
/// report on a bounded pool.
///
/// Each task owns its report exclusively for the whole chain. The first
/// failing report aborts the stage.
pub struct RuleEngine {
    threads: usize,
    cancel: CancellationToken,
}

impl RuleEngine {
    pub fn new(threads: usize, cancel: CancellationToken) -> Self {
        Self {
            threads: threads.max(1),
            cancel,
        }
    }

    /// Returns the processed reports in input order.
    pub async fn apply(
        &self,
        chain: Arc<RuleChain>,
        template: Arc<MessageTemplate>,
        reports: Vec<Report>,
    ) -> CoreResult<Vec<Report>> {
        let start = Instant::now();
        let count = reports.len();
        let semaphore = Arc::new(Semaphore::new(self.threads));
        let mut join_set = JoinSet::new();

        for (idx, mut report) in reports.into_iter().enumerate() {
            let semaphore = Arc::clone(&semaphore);
            let chain = Arc::clone(&chain);
            let template = Arc::clone(&template);
            join_set.spawn(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .map_err(|_| {
                        CoreError::from(CoreReason::Interrupted).with_detail("rule worker pool closed")
                    })?;
                let account = report.account_id();
                tokio::task::spawn_blocking(move || {
                    apply_rules(&mut report, &chain, &template).map(|()| (idx, report))
                })
                .await
                .map_err(|e| {
                    CoreError::from(CoreReason::Processing(FailureKind::Rule))
                        .with_detail(format!("rule task for account {account} panicked: {e}"))
                })?
            });
        }

        let mut slots: Vec<Option<Report>> = (0..count).map(|_| None).collect();
        loop {
            let next = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    join_set.abort_all();
                    return Err(CoreError::from(CoreReason::Interrupted)
                        .with_detail("rule stage cancelled"));
                }
                next = join_set.join_next() => next,
            };
            match next {
                None => break,
                Some(Ok(Ok((idx, report)))) => slots[idx] = Some(report),
                Some(Ok(Err(e))) => {
                    join_set.abort_all();
                    return Err(e);
                }
                Some(Err(e)) => {
                    join_set.abort_all();
                    return Err(CoreError::from(CoreReason::Processing(FailureKind::Rule))
                        .with_detail(format!("rule task failed to join: {e}")));
                }
            }
        }

        let processed: Vec<Report> = slots.into_iter().flatten().collect();
        aw_info!(rule,
            rules = chain.len(),
            reports = processed.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "rules applied"
        );
        Ok(processed)
    }
}

// ---------------------------------------------------------------------------
// Per-report chain
// ---------------------------------------------------------------------------

/// Run `chain` over `report` in order, then append and render the alert
/// message column. A report left without rows only gets the column; the
/// template is not bound against it.
///
/// For each rule: append its new columns, populate every row, then drop
/// the rows it marks for removal. A rule that asks for the reserved
/// message column fails with `InvalidState` before touching the report.
pub fn apply_rules(report: &mut Report, chain: &RuleChain, template: &MessageTemplate) -> CoreResult<()> {
    for slot in chain.iter() {
        apply_rule(report, slot)?;
    }

    report.append_column(ALERT_MESSAGE_COLUMN)?;
    if report.is_empty() {
        return Ok(());
    }
    report.pad_rows();
    let bound = template.bind(report)?;
    report.try_for_each_row_mut(|row| {
        let message = bound.render(row.cells());
        row.set(ALERT_MESSAGE_COLUMN, message)
    })
}

fn apply_rule(report: &mut Report, slot: &RuleSlot) -> CoreResult<()> {
    let columns = slot.rule.new_columns();
    if columns.iter().any(|c| c == ALERT_MESSAGE_COLUMN) {
        return Err(CoreError::from(CoreReason::InvalidState).with_detail(format!(
            "rule {} cannot add the reserved column {ALERT_MESSAGE_COLUMN:?}",
            slot.name
        )));
    }
    for column in columns {
        report.append_column(column)?;
    }
    report.pad_rows();

    report
        .try_for_each_row_mut(|row| slot.rule.populate_row(row))
        .map_err(|e| rule_failed(hook_label(slot, "populate"), e))?;
    let removed = report
        .try_remove_rows_where(|row| slot.rule.should_remove(row))
        .map_err(|e| rule_failed(hook_label(slot, "row filter"), e))?;

    if removed > 0 {
        aw_debug!(rule,
            rule = %slot.name,
            account = %report.account_id(),
            removed = removed,
            "rows removed"
        );
    }
    Ok(())
}

fn hook_label(slot: &RuleSlot, hook: &str) -> String {
    format!("rule {} failed in {hook}", slot.name)
}

fn rule_failed(label: String, err: CoreError) -> CoreError {
    CoreError::from(CoreReason::Processing(FailureKind::Rule)).with_detail(format!("{label}: {err}"))
}
