use std::path::{Path, PathBuf};

use async_trait::async_trait;
use aw_core::error::{CoreError, CoreReason, CoreResult, FailureKind};
use aw_core::query::ReportQuery;
use aw_core::session::AccountSession;
use aw_core::transport::{RawReport, ReportTransport};
use orion_error::prelude::*;

/// Serves reports exported to disk as
/// `<report_dir>/<REPORT_TYPE>/<account_id>.json`, and whole tables as
/// `<report_dir>/tables/<table>.json`.
///
/// A missing or unreadable file is a transport failure and is retried; a
/// file that is not a `{"header": [...], "rows": [[...]]}` document is a
/// malformed report.
#[derive(Debug, Clone)]
pub struct LocalReportTransport {
    report_dir: PathBuf,
}

impl LocalReportTransport {
    pub fn new(report_dir: impl Into<PathBuf>) -> Self {
        Self {
            report_dir: report_dir.into(),
        }
    }

    pub fn report_dir(&self) -> &Path {
        &self.report_dir
    }

    pub fn report_path(&self, report_type: &str, account: &AccountSession) -> PathBuf {
        self.report_dir
            .join(report_type)
            .join(format!("{}.json", account.account_id))
    }

    pub fn table_path(&self, table: &str) -> PathBuf {
        self.report_dir.join("tables").join(format!("{table}.json"))
    }
}

async fn read_raw(path: &Path) -> CoreResult<RawReport> {
    let content = tokio::fs::read_to_string(path).await.map_err(|e| {
        CoreError::from(CoreReason::Processing(FailureKind::Transport))
            .with_detail(format!("cannot read {}: {e}", path.display()))
    })?;
    serde_json::from_str::<RawReport>(&content).map_err(|e| {
        CoreError::from(CoreReason::Processing(FailureKind::MalformedReport))
            .with_detail(format!("{}: {e}", path.display()))
    })
}

#[async_trait]
impl ReportTransport for LocalReportTransport {
    async fn fetch(&self, session: &AccountSession, query: &ReportQuery) -> CoreResult<RawReport> {
        read_raw(&self.report_path(&query.report_type, session)).await
    }

    async fn fetch_table(&self, table: &str) -> CoreResult<RawReport> {
        if table.is_empty() || table.contains(['/', '\\']) || table.starts_with('.') {
            return Err(CoreError::from(CoreReason::InvalidArgument)
                .with_detail(format!("invalid table name {table:?}")));
        }
        read_raw(&self.table_path(table)).await
    }
}

#[cfg(test)]
mod tests {
    use aw_config::AccountId;
    use aw_core::session::SessionPrototype;

    use super::*;

    fn session(id: u64) -> AccountSession {
        SessionPrototype {
            developer_token: "dev".into(),
            user_agent: "test".into(),
            manager_account_id: None,
            endpoint: "local".into(),
        }
        .for_account(AccountId::new(id))
        .unwrap()
    }

    fn query() -> ReportQuery {
        ReportQuery::new("ACCOUNT_PERFORMANCE_REPORT", "ExternalCustomerId,Clicks")
    }

    fn write(dir: &Path, account: u64, body: &str) {
        let type_dir = dir.join("ACCOUNT_PERFORMANCE_REPORT");
        std::fs::create_dir_all(&type_dir).unwrap();
        std::fs::write(type_dir.join(format!("{account}.json")), body).unwrap();
    }

    #[tokio::test]
    async fn reads_exported_report() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            42,
            r#"{"header": ["Customer ID", "Clicks"], "rows": [["42", "7"]]}"#,
        );
        let raw = LocalReportTransport::new(dir.path())
            .fetch(&session(42), &query())
            .await
            .unwrap();
        assert_eq!(raw.header, vec!["Customer ID", "Clicks"]);
        assert_eq!(raw.rows, vec![vec!["42".to_string(), "7".to_string()]]);
    }

    #[tokio::test]
    async fn missing_file_is_transport_failure() {
        let dir = tempfile::tempdir().unwrap();
        let err = LocalReportTransport::new(dir.path())
            .fetch(&session(7), &query())
            .await
            .unwrap_err();
        assert_eq!(err.reason(), &CoreReason::Processing(FailureKind::Transport));
        assert!(err.to_string().contains("7.json"), "{err}");
    }

    #[tokio::test]
    async fn garbage_is_malformed() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), 9, "header: nope");
        let err = LocalReportTransport::new(dir.path())
            .fetch(&session(9), &query())
            .await
            .unwrap_err();
        assert_eq!(err.reason(), &CoreReason::Processing(FailureKind::MalformedReport));
    }

    #[tokio::test]
    async fn reads_table_and_rejects_path_names() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("tables")).unwrap();
        std::fs::write(
            dir.path().join("tables/AW_ReportAccount.json"),
            r#"{"header": ["AccountId", "Day"], "rows": [["1", "2024-03-01"]]}"#,
        )
        .unwrap();
        let transport = LocalReportTransport::new(dir.path());

        let raw = transport.fetch_table("AW_ReportAccount").await.unwrap();
        assert_eq!(raw.header, vec!["AccountId", "Day"]);
        assert_eq!(raw.rows.len(), 1);

        let err = transport.fetch_table("../secrets").await.unwrap_err();
        assert_eq!(err.reason(), &CoreReason::InvalidArgument);
        let err = transport.fetch_table("AW_Missing").await.unwrap_err();
        assert_eq!(err.reason(), &CoreReason::Processing(FailureKind::Transport));
    }
}
