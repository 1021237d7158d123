//! Report transport boundary and the raw payload it returns.

use async_trait::async_trait;
use orion_error::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreReason, CoreResult, FailureKind};
use crate::query::ReportQuery;
use crate::session::AccountSession;

/// Report payload as delivered by a transport: a display header followed by
/// rows of cells.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct RawReport {
    pub header: Vec<String>,
    #[serde(default)]
    pub rows: Vec<Vec<String>>,
}

/// Fetches one account's report for a query.
///
/// Transient failures should be `Processing(Transport)` so the download
/// stage retries them; payloads that can never parse should be
/// `Processing(MalformedReport)`.
#[async_trait]
pub trait ReportTransport: Send + Sync {
    async fn fetch(&self, session: &AccountSession, query: &ReportQuery) -> CoreResult<RawReport>;

    /// Fetches a whole local table holding rows of many accounts. The
    /// header carries the table's own column names.
    async fn fetch_table(&self, table: &str) -> CoreResult<RawReport> {
        Err(CoreError::from(CoreReason::Processing(FailureKind::Transport))
            .with_detail(format!("transport does not serve tables, cannot read {table:?}")))
    }
}
