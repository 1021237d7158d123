use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use aw_config::{AccountId, PluginSpec};
use aw_core::date_range::DateRange;
use aw_core::error::{CoreError, CoreReason, CoreResult, FailureKind};
use aw_core::plugin::{DownloadOutcome, PluginBuildCtx, ReportDownloader, plugin_params};
use aw_core::report::{ColumnIndex, Report};
use aw_core::retry::{RetryPolicy, run_with_retry};
use aw_core::session::SessionPrototype;
use aw_core::transport::{RawReport, ReportTransport};
use chrono::NaiveDate;
use orion_error::prelude::*;
use orion_error::ErrorOweBase;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;

/// Header every table mapping must produce; rows are split by its value.
pub const EXTERNAL_CUSTOMER_ID: &str = "ExternalCustomerId";
/// Table column the date range filters on.
pub const DAY_COLUMN: &str = "Day";

#[derive(Debug, Clone, Deserialize)]
pub struct ColumnMapping {
    #[serde(rename = "DatabaseColumnName")]
    pub table_column: String,
    #[serde(rename = "ReportDataHeaderName")]
    pub header: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TableQuery {
    #[serde(rename = "Table")]
    pub table: String,
    #[serde(rename = "ColumnMappings")]
    pub column_mappings: Vec<ColumnMapping>,
    #[serde(rename = "DateRange", default)]
    pub date_range: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TableDownloaderParams {
    #[serde(rename = "ReportQuery")]
    pub query: TableQuery,
}

/// Reads one local table holding rows of every account and splits it into
/// one report per `ExternalCustomerId`.
///
/// The alert's account list is not consulted: the table decides which
/// accounts get a report. Any failure aborts the alert.
pub struct TableReportDownloader {
    query: TableQuery,
    header: Vec<String>,
    customer_idx: usize,
    retry: RetryPolicy,
    transport: Arc<dyn ReportTransport>,
    cancel: CancellationToken,
}

impl TableReportDownloader {
    pub fn from_spec(spec: &PluginSpec, ctx: &PluginBuildCtx) -> CoreResult<Self> {
        let params: TableDownloaderParams = plugin_params(spec)?;
        Self::new(params, ctx)
    }

    pub fn new(params: TableDownloaderParams, ctx: &PluginBuildCtx) -> CoreResult<Self> {
        let query = params.query;
        if query.table.trim().is_empty() {
            return Err(config_error("ReportQuery.Table must not be empty"));
        }
        let header: Vec<String> = query.column_mappings.iter().map(|m| m.header.clone()).collect();
        ColumnIndex::new(header.iter().cloned()).owe(CoreReason::ConfigLoad)?;
        let customer_idx = header
            .iter()
            .position(|h| h == EXTERNAL_CUSTOMER_ID)
            .ok_or_else(|| {
                config_error(format!(
                    "ReportQuery.ColumnMappings must map a column to {EXTERNAL_CUSTOMER_ID:?}"
                ))
            })?;
        if let Some(range) = &query.date_range {
            DateRange::parse(range).owe(CoreReason::ConfigLoad)?;
        }
        Ok(Self {
            query,
            header,
            customer_idx,
            retry: ctx.retry.clone(),
            transport: Arc::clone(&ctx.transport),
            cancel: ctx.cancel.clone(),
        })
    }

    /// Human-readable form of the query, for logs.
    pub fn describe(&self) -> String {
        let columns: Vec<String> = self
            .query
            .column_mappings
            .iter()
            .map(|m| format!("{} AS {}", m.table_column, m.header))
            .collect();
        let mut out = format!("SELECT {} FROM {}", columns.join(", "), self.query.table);
        if let Some(range) = &self.query.date_range {
            out.push_str(&format!(" WHERE {DAY_COLUMN} DURING {range}"));
        }
        out
    }

    /// Project, filter and split a fetched table.
    fn split(&self, raw: RawReport, range: Option<DateRange>) -> CoreResult<Vec<Report>> {
        let table = self.query.table.as_str();
        let position = |column: &str| {
            raw.header.iter().position(|h| h == column).ok_or_else(|| {
                malformed(format!("table {table:?} has no column {column:?}"))
            })
        };
        let sources = self
            .query
            .column_mappings
            .iter()
            .map(|m| position(&m.table_column))
            .collect::<CoreResult<Vec<_>>>()?;
        let day_idx = match range {
            Some(_) => Some(position(DAY_COLUMN)?),
            None => None,
        };

        let mut reports: Vec<Report> = Vec::new();
        let mut by_account: HashMap<AccountId, usize> = HashMap::new();
        for (i, row) in raw.rows.iter().enumerate() {
            if row.len() != raw.header.len() {
                return Err(malformed(format!(
                    "table {table:?} row {} has {} cells, header has {}",
                    i + 1,
                    row.len(),
                    raw.header.len()
                )));
            }
            if let (Some(range), Some(idx)) = (range, day_idx) {
                let day = parse_day(&row[idx])
                    .ok_or_else(|| malformed(format!("row {}: {:?} is not a date", i + 1, row[idx])))?;
                if !range.contains(day) {
                    continue;
                }
            }

            let cells: Vec<String> = sources.iter().map(|&src| row[src].clone()).collect();
            let account = cells[self.customer_idx]
                .parse::<AccountId>()
                .owe(CoreReason::Processing(FailureKind::MalformedReport))?;
            let slot = match by_account.get(&account) {
                Some(&slot) => slot,
                None => {
                    reports.push(Report::new(table, account, self.header.iter().cloned())?);
                    by_account.insert(account, reports.len() - 1);
                    reports.len() - 1
                }
            };
            reports[slot].add_row(cells)?;
        }
        Ok(reports)
    }
}

#[async_trait]
impl ReportDownloader for TableReportDownloader {
    async fn download_reports(
        &self,
        _session: &SessionPrototype,
        _accounts: &[AccountId],
    ) -> CoreResult<DownloadOutcome> {
        let range = self
            .query
            .date_range
            .as_deref()
            .map(DateRange::parse)
            .transpose()?;
        aw_debug!(fetch, query = %self.describe(), "table query");

        let table = self.query.table.as_str();
        let transport = self.transport.as_ref();
        let description = format!("download table {table}");
        let raw = run_with_retry(&self.retry, &description, &self.cancel, move |attempt| async move {
            aw_debug!(fetch, table = %table, attempt = attempt, "fetching table");
            transport.fetch_table(table).await
        })
        .await?;

        let rows = raw.rows.len();
        let reports = self.split(raw, range)?;
        aw_info!(fetch,
            table = %table,
            rows = rows,
            reports = reports.len(),
            "table split into account reports"
        );
        Ok(DownloadOutcome::from_reports(reports))
    }
}

/// `yyyy-MM-dd`, optionally followed by a time, or `yyyyMMdd`.
fn parse_day(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    raw.get(..10)
        .and_then(|head| NaiveDate::parse_from_str(head, "%Y-%m-%d").ok())
        .or_else(|| NaiveDate::parse_from_str(raw, "%Y%m%d").ok())
}

fn config_error(detail: impl Into<String>) -> CoreError {
    CoreError::from(CoreReason::ConfigLoad).with_detail(detail.into())
}

fn malformed(detail: String) -> CoreError {
    CoreError::from(CoreReason::Processing(FailureKind::MalformedReport)).with_detail(detail)
}
