//! End-to-end alert runs against exported report fixtures.
//!
//! Each test writes a settings file, an alert file, an account list and
//! per-account report exports into a temp dir, then drives a whole run
//! through `RunPlan`.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use aw_config::AlertingConfig;
use aw_core::error::{CoreReason, CoreResult};
use aw_core::plugin::{AlertAction, AlertRule};
use aw_core::report::{RowMut, RowView};
use aw_runtime::{RunPlan, RuntimeReason};
use aw_runtime::plugins::builtin_registry;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use aw_runtime::tracing_init::DomainFormat;

const SETTINGS: &str = r#"
alerts = "alerts.json"
accounts_file = "accounts.txt"
work_root = "out"

[processor]
threads = 2

[retry]
max_attempts = 2
backoff = "10ms"

[session]
developer_token = "dev-token"

[transport]
kind = "local"
report_dir = "reports"
"#;

const FIELDS_MAPPING: &str = r#"{
    "Customer ID": "ExternalCustomerId",
    "Account": "AccountDescriptiveName",
    "Cost": "Cost",
    "Clicks": "Clicks"
}"#;

fn init_test_logging() {
    let _ = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .event_format(DomainFormat::new())
                .with_test_writer()
                .with_filter(EnvFilter::try_new("debug").unwrap()),
        )
        .try_init();
}

fn downloader_json() -> String {
    format!(
        r#"{{
            "Type": "AwqlReportDownloader",
            "ReportQuery": {{
                "ReportType": "ACCOUNT_PERFORMANCE_REPORT",
                "Fields": "ExternalCustomerId,AccountDescriptiveName,Cost,Clicks",
                "DateRange": "LAST_7_DAYS"
            }},
            "FieldsMapping": {FIELDS_MAPPING}
        }}"#
    )
}

/// Settings, account list and exports for accounts 111-111-1111 and
/// 2222222222; 3333333333 has no export and fails its download.
fn write_fixture(dir: &Path, alerts_json: &str) {
    std::fs::write(dir.join("alerting.toml"), SETTINGS).unwrap();
    std::fs::write(dir.join("alerts.json"), alerts_json).unwrap();
    std::fs::write(
        dir.join("accounts.txt"),
        "# managed accounts\n111-111-1111\n2222222222\n\n3333333333\n2222222222\n",
    )
    .unwrap();

    let reports = dir.join("reports/ACCOUNT_PERFORMANCE_REPORT");
    std::fs::create_dir_all(&reports).unwrap();
    std::fs::write(
        reports.join("1111111111.json"),
        r#"{"header": ["Customer ID", "Account", "Cost", "Clicks"],
            "rows": [["1111111111", "Alpha", "1500000", "3"]]}"#,
    )
    .unwrap();
    std::fs::write(
        reports.join("2222222222.json"),
        r#"{"header": ["Customer ID", "Account", "Cost", "Clicks"],
            "rows": [["2222222222", "Beta", "2000000", "0"],
                     ["2222222222", "Beta", "10000", "1"]]}"#,
    )
    .unwrap();
}

fn load(dir: &Path) -> AlertingConfig {
    AlertingConfig::load(dir.join("alerting.toml")).unwrap()
}

#[tokio::test]
async fn full_run_writes_alerts_and_skips_empty_alert() {
    init_test_logging();
    let dir = tempfile::tempdir().unwrap();
    let alerts = format!(
        r#"{{"Alerts": [
            {{
                "AlertName": "Spend report",
                "ReportDownloader": {downloader},
                "Rules": [
                    {{"Type": "ConvertMoneyValue"}},
                    {{"ClassName": "AddAccountManager"}}
                ],
                "AlertMessage": "{{AccountDescriptiveName}} ({{ExternalCustomerId}}) spent {{Cost}} for {{Clicks}} clicks, manager {{AccountManagerName}}",
                "Actions": [
                    {{"Type": "SimpleLogFileWriter", "LogFilePathname": "alerts.log", "AppendMode": false}},
                    {{"Type": "PerAccountManagerEmailSender", "Subject": "Spend", "CC": "ops@example.com"}}
                ]
            }},
            {{
                "AlertName": "Dry run",
                "ReportDownloader": {{"Type": "NoOpAlertReportDownloader"}},
                "AlertMessage": "never rendered",
                "Actions": [{{"Type": "SimpleConsoleWriter"}}]
            }}
        ]}}"#,
        downloader = downloader_json()
    );
    write_fixture(dir.path(), &alerts);

    let plan = RunPlan::bootstrap(&load(dir.path()), None).unwrap();
    assert_eq!(plan.accounts.len(), 3);
    let summary = plan.run().await.unwrap();

    assert_eq!(summary.alerts.len(), 2);
    let spend = &summary.alerts[0];
    assert_eq!(spend.name, "Spend report");
    assert_eq!(spend.reports, 2);
    assert_eq!(spend.rows, 3);
    assert_eq!(spend.download_failures, 1);
    assert!(spend.failed_actions.is_empty());

    let dry = &summary.alerts[1];
    assert_eq!((dry.reports, dry.rows, dry.download_failures), (0, 0, 0));

    let log = std::fs::read_to_string(dir.path().join("out/alerts.log")).unwrap();
    assert!(log.starts_with("===== Begin of this run =====\n"));
    assert!(log.contains("Alpha (1111111111) spent 1.5 for 3 clicks, manager Michael F.\n"));
    assert!(log.contains("Beta (2222222222) spent 2 for 0 clicks, manager Josh G.\n"));
    assert!(log.contains("Beta (2222222222) spent 0.01 for 1 clicks, manager Josh G.\n"));
    assert!(log.ends_with("===== End of this run =====\n\n"));
}

#[tokio::test]
async fn unknown_plugin_aborts_before_any_stage() {
    let dir = tempfile::tempdir().unwrap();
    let alerts = format!(
        r#"{{"Alerts": [
            {{
                "AlertName": "Fine",
                "ReportDownloader": {downloader},
                "AlertMessage": "{{Clicks}}",
                "Actions": [{{"Type": "SimpleLogFileWriter", "LogFilePathname": "alerts.log"}}]
            }},
            {{
                "AlertName": "Broken",
                "ReportDownloader": {{"Type": "NoOpAlertReportDownloader"}},
                "AlertMessage": "x",
                "Actions": [{{"Type": "PagerDutyNotifier"}}]
            }}
        ]}}"#,
        downloader = downloader_json()
    );
    write_fixture(dir.path(), &alerts);

    let plan = RunPlan::bootstrap(&load(dir.path()), None).unwrap();
    let err = plan.run().await.unwrap_err();
    assert_eq!(err.reason(), &RuntimeReason::Core(CoreReason::ConfigLoad));
    let msg = err.to_string();
    assert!(msg.contains("alert \"Broken\" failed"), "{msg}");
    assert!(msg.contains("PagerDutyNotifier"), "{msg}");
    assert!(!dir.path().join("out/alerts.log").exists());
}

#[tokio::test]
async fn accounts_override_replaces_configured_file() {
    let dir = tempfile::tempdir().unwrap();
    let alerts = r#"{"Alerts": [{
        "AlertName": "Dry run",
        "ReportDownloader": {"Type": "NoOpAlertReportDownloader"},
        "AlertMessage": "x",
        "Actions": [{"Type": "SimpleConsoleWriter"}]
    }]}"#;
    write_fixture(dir.path(), alerts);
    let override_file = dir.path().join("only.txt");
    std::fs::write(&override_file, "4444444444\n").unwrap();

    let plan = RunPlan::bootstrap(&load(dir.path()), Some(&override_file)).unwrap();
    assert_eq!(plan.accounts.iter().map(|a| a.get()).collect::<Vec<_>>(), vec![4444444444]);
}

#[tokio::test]
async fn cancelled_run_is_interrupted() {
    let dir = tempfile::tempdir().unwrap();
    let alerts = format!(
        r#"{{"Alerts": [{{
            "AlertName": "Spend report",
            "ReportDownloader": {downloader},
            "AlertMessage": "{{Clicks}}",
            "Actions": [{{"Type": "SimpleConsoleWriter"}}]
        }}]}}"#,
        downloader = downloader_json()
    );
    write_fixture(dir.path(), &alerts);

    let plan = RunPlan::bootstrap(&load(dir.path()), None).unwrap();
    plan.cancel_token().cancel();
    let err = plan.run().await.unwrap_err();
    assert_eq!(err.reason(), &RuntimeReason::Core(CoreReason::Interrupted));
}

// ---------------------------------------------------------------------------
// Invocation counts through custom plugins
// ---------------------------------------------------------------------------

#[derive(Default)]
struct Counts {
    populated: AtomicUsize,
    checked: AtomicUsize,
    initialized: AtomicUsize,
    entries: AtomicUsize,
    finalized: AtomicUsize,
}

struct CountingRule(Arc<Counts>);

impl AlertRule for CountingRule {
    fn populate_row(&self, _row: &mut RowMut<'_>) -> CoreResult<()> {
        self.0.populated.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn should_remove(&self, _row: &RowView<'_>) -> CoreResult<bool> {
        self.0.checked.fetch_add(1, Ordering::SeqCst);
        Ok(false)
    }
}

struct CountingAction(Arc<Counts>);

#[async_trait]
impl AlertAction for CountingAction {
    async fn initialize(&mut self) -> CoreResult<()> {
        self.0.initialized.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn process_entry(&mut self, row: &RowView<'_>) -> CoreResult<()> {
        row.require("AlertMessage")?;
        self.0.entries.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn finalize(&mut self) -> CoreResult<()> {
        self.0.finalized.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[tokio::test]
async fn custom_plugins_see_every_row_once() {
    let dir = tempfile::tempdir().unwrap();
    let alerts = format!(
        r#"{{"Alerts": [{{
            "AlertName": "Counted",
            "ReportDownloader": {downloader},
            "Rules": [{{"Type": "acme.CountingRule"}}],
            "AlertMessage": "{{AccountDescriptiveName}}",
            "Actions": [{{"Type": "acme.CountingAction"}}, {{"Type": "acme.CountingAction"}}]
        }}]}}"#,
        downloader = downloader_json()
    );
    write_fixture(dir.path(), &alerts);

    let rule_counts = Arc::new(Counts::default());
    let action_counts = Arc::new(Counts::default());
    let mut registry = builtin_registry();
    {
        let counts = Arc::clone(&rule_counts);
        registry.register_rule("acme.CountingRule", move |_, _| {
            Ok(Box::new(CountingRule(Arc::clone(&counts))))
        });
        let counts = Arc::clone(&action_counts);
        registry.register_action("acme.CountingAction", move |_, _| {
            Ok(Box::new(CountingAction(Arc::clone(&counts))))
        });
    }

    let plan = RunPlan::bootstrap_with(&load(dir.path()), None, registry).unwrap();
    let summary = plan.run().await.unwrap();
    assert_eq!(summary.alerts[0].rows, 3);

    assert_eq!(rule_counts.populated.load(Ordering::SeqCst), 3);
    assert_eq!(rule_counts.checked.load(Ordering::SeqCst), 3);
    assert_eq!(action_counts.initialized.load(Ordering::SeqCst), 2);
    assert_eq!(action_counts.entries.load(Ordering::SeqCst), 6);
    assert_eq!(action_counts.finalized.load(Ordering::SeqCst), 2);
}

struct ClaimsMessageColumn;

impl AlertRule for ClaimsMessageColumn {
    fn new_columns(&self) -> Vec<String> {
        vec!["AlertMessage".to_string()]
    }
}

#[tokio::test]
async fn rule_claiming_message_column_fails_the_run() {
    let dir = tempfile::tempdir().unwrap();
    let alerts = format!(
        r#"{{"Alerts": [{{
            "AlertName": "Clobbered",
            "ReportDownloader": {downloader},
            "Rules": [{{"Type": "acme.ClaimsMessageColumn"}}],
            "AlertMessage": "{{Clicks}}",
            "Actions": [{{"Type": "SimpleLogFileWriter", "LogFilePathname": "alerts.log"}}]
        }}]}}"#,
        downloader = downloader_json()
    );
    write_fixture(dir.path(), &alerts);

    let mut registry = builtin_registry();
    registry.register_rule("acme.ClaimsMessageColumn", |_, _| Ok(Box::new(ClaimsMessageColumn)));

    let plan = RunPlan::bootstrap_with(&load(dir.path()), None, registry).unwrap();
    let err = plan.run().await.unwrap_err();
    assert_eq!(err.reason(), &RuntimeReason::Core(CoreReason::InvalidState));
    let msg = err.to_string();
    assert!(msg.contains("alert \"Clobbered\" failed"), "{msg}");
    assert!(msg.contains("acme.ClaimsMessageColumn"), "{msg}");
    assert!(msg.contains("AlertMessage"), "{msg}");
    assert!(!dir.path().join("out/alerts.log").exists());
}

#[tokio::test]
async fn table_downloader_reports_every_customer_in_the_table() {
    let dir = tempfile::tempdir().unwrap();
    let alerts = r#"{"Alerts": [{
        "AlertName": "Table spend",
        "ReportDownloader": {
            "Type": "TableReportDownloader",
            "ReportQuery": {
                "Table": "AW_ReportAccount",
                "ColumnMappings": [
                    {"DatabaseColumnName": "AccountId", "ReportDataHeaderName": "ExternalCustomerId"},
                    {"DatabaseColumnName": "Cost", "ReportDataHeaderName": "Cost"}
                ],
                "DateRange": "20240301,20240331"
            }
        },
        "Rules": [{"Type": "ConvertMoneyValue"}],
        "AlertMessage": "{ExternalCustomerId} spent {Cost}",
        "Actions": [{"Type": "SimpleLogFileWriter", "LogFilePathname": "table.log"}]
    }]}"#;
    write_fixture(dir.path(), alerts);
    let tables = dir.path().join("reports/tables");
    std::fs::create_dir_all(&tables).unwrap();
    std::fs::write(
        tables.join("AW_ReportAccount.json"),
        r#"{"header": ["AccountId", "Day", "Cost"],
            "rows": [["5555555555", "2024-03-02", "2500000"],
                     ["6666666666", "2024-02-28", "1000000"]]}"#,
    )
    .unwrap();

    let plan = RunPlan::bootstrap(&load(dir.path()), None).unwrap();
    let summary = plan.run().await.unwrap();
    assert_eq!((summary.alerts[0].reports, summary.alerts[0].rows), (1, 1));

    let log = std::fs::read_to_string(dir.path().join("out/table.log")).unwrap();
    assert!(log.contains("5555555555 spent 2.5\n"), "{log}");
    assert!(!log.contains("6666666666"), "{log}");
}
