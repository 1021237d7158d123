use aw_config::AccountId;
use orion_error::prelude::*;

use super::*;
use crate::error::CoreReason;

fn sample() -> Report {
    let mut report = Report::new(
        "ACCOUNT_PERFORMANCE_REPORT",
        AccountId::new(1232198123),
        ["ExternalCustomerId", "Impressions", "Clicks"],
    )
    .unwrap();
    report
        .add_row(vec!["1232198123".into(), "1978".into(), "10".into()])
        .unwrap();
    report
        .add_row(vec!["1232198123".into(), "12".into(), "0".into()])
        .unwrap();
    report
}

fn assert_invariants(report: &Report) {
    assert_eq!(report.columns().len(), report.column_index_map().len());
    for (i, name) in report.columns().iter().enumerate() {
        assert_eq!(report.column_index(name).unwrap(), i);
    }
}

#[test]
fn duplicate_header_rejected() {
    let err = Report::new("X", AccountId::new(1), ["a", "b", "a"]).unwrap_err();
    assert_eq!(err.reason(), &CoreReason::InvalidArgument);
}

#[test]
fn append_column_assigns_next_index() {
    let mut report = sample();
    assert_eq!(report.append_column("Cost").unwrap(), 3);
    assert_eq!(report.column_index("Cost").unwrap(), 3);
    assert_invariants(&report);
    // rows are not widened by append
    assert!(report.rows().iter().all(|r| r.len() == 3));
    report.pad_rows();
    assert!(report.rows().iter().all(|r| r.len() == 4));
}

#[test]
fn append_duplicate_leaves_report_unchanged() {
    let mut report = sample();
    let before = report.clone();
    let err = report.append_column("Clicks").unwrap_err();
    assert_eq!(err.reason(), &CoreReason::InvalidArgument);
    assert_eq!(report, before);
    assert_invariants(&report);
}

#[test]
fn column_index_missing_is_invalid_argument() {
    let report = sample();
    let err = report.column_index("Cost").unwrap_err();
    assert_eq!(err.reason(), &CoreReason::InvalidArgument);
}

#[test]
fn add_row_checks_width() {
    let mut report = sample();
    let err = report.add_row(vec!["only-one".into()]).unwrap_err();
    assert_eq!(err.reason(), &CoreReason::InvalidArgument);
    assert_eq!(report.row_count(), 2);
}

#[test]
fn remove_rows_keeps_order() {
    let mut report = sample();
    report
        .add_row(vec!["1232198123".into(), "500".into(), "3".into()])
        .unwrap();
    let removed = report.remove_rows_where(|row| row.get("Clicks") == Some("0"));
    assert_eq!(removed, 1);
    let impressions: Vec<_> = report
        .row_views()
        .map(|r| r.get("Impressions").unwrap())
        .collect();
    assert_eq!(impressions, vec!["1978", "500"]);
}

#[test]
fn try_remove_rows_error_removes_nothing() {
    let mut report = sample();
    let err = report
        .try_remove_rows_where(|row| {
            let clicks: u32 = row.require("Clicks")?.parse().map_err(|_| {
                CoreError::from(CoreReason::InvalidArgument).with_detail("bad clicks")
            })?;
            if clicks == 0 {
                Err(CoreError::from(CoreReason::InvalidState).with_detail("zero clicks"))
            } else {
                Ok(true)
            }
        })
        .unwrap_err();
    assert_eq!(err.reason(), &CoreReason::InvalidState);
    assert_eq!(report.row_count(), 2);
}

#[test]
fn row_mut_sets_by_name() {
    let mut report = sample();
    report.append_column("Ctr").unwrap();
    report.pad_rows();
    report
        .try_for_each_row_mut(|row| {
            let clicks: f64 = row.require("Clicks")?.parse().unwrap_or(0.0);
            let impressions: f64 = row.require("Impressions")?.parse().unwrap_or(1.0);
            row.set("Ctr", format!("{:.2}", clicks / impressions * 100.0))
        })
        .unwrap();
    assert_eq!(report.row(0).unwrap().get("Ctr"), Some("0.51"));
    assert_eq!(report.row(1).unwrap().get("Ctr"), Some("0.00"));
}

#[test]
fn row_mut_unknown_column_fails() {
    let mut report = sample();
    let err = report
        .try_for_each_row_mut(|row| row.set("Missing", "x"))
        .unwrap_err();
    assert_eq!(err.reason(), &CoreReason::InvalidArgument);
}

#[test]
fn row_mut_set_before_padding_is_invalid_state() {
    let mut report = sample();
    report.append_column("Ctr").unwrap();
    let err = report
        .try_for_each_row_mut(|row| row.set("Ctr", "1.0"))
        .unwrap_err();
    assert_eq!(err.reason(), &CoreReason::InvalidState);
    assert!(err.to_string().contains("row has 3 cells"), "{err}");
    assert!(report.row_views().all(|row| row.get("Ctr").is_none()));
}

#[test]
fn display_dumps_header_and_rows() {
    let report = sample();
    let text = report.to_string();
    assert_eq!(
        text,
        "ACCOUNT_PERFORMANCE_REPORT:\nHeader:\nExternalCustomerId,Impressions,Clicks\nData:\n\
         1232198123,1978,10\n1232198123,12,0\n"
    );
}

#[test]
fn report_set_is_shared_read_only() {
    let set = ReportSet::new(vec![sample(), sample()]);
    let clone = set.clone();
    assert_eq!(clone.len(), 2);
    assert_eq!(set.total_rows(), 4);
    let pairs: Vec<_> = set[0].row(0).unwrap().iter().collect();
    assert_eq!(pairs[1], ("Impressions", "1978"));
}
