//! Turns transport payloads into [`Report`]s.

use std::collections::HashMap;

use aw_config::AccountId;
use orion_error::prelude::*;
use orion_error::ErrorOweBase;

use crate::error::{CoreError, CoreReason, CoreResult, FailureKind};
use crate::report::Report;
use crate::transport::RawReport;

/// Display header name → report field name.
pub type FieldsMapping = HashMap<String, String>;

#[derive(Debug, Clone)]
pub struct ReportLoader {
    report_type: String,
    fields_mapping: Option<FieldsMapping>,
}

impl ReportLoader {
    pub fn new(report_type: impl Into<String>, fields_mapping: Option<FieldsMapping>) -> Self {
        Self {
            report_type: report_type.into(),
            fields_mapping,
        }
    }

    /// Build a report from `raw`. With a mapping, every header name must be
    /// mapped; without one the header is used as is. Unknown headers,
    /// duplicate columns and ragged rows are `Processing(MalformedReport)`.
    pub fn load(&self, account: AccountId, raw: RawReport) -> CoreResult<Report> {
        let header = match &self.fields_mapping {
            Some(mapping) => raw
                .header
                .iter()
                .map(|display| {
                    mapping.get(display).cloned().ok_or_else(|| {
                        malformed(format!("unknown field name {display:?} in report header"))
                    })
                })
                .collect::<CoreResult<Vec<_>>>()?,
            None => raw.header,
        };

        let mut report = Report::new(self.report_type.clone(), account, header)
            .owe(CoreReason::Processing(FailureKind::MalformedReport))?;
        for (i, row) in raw.rows.into_iter().enumerate() {
            report
                .add_row(row)
                .map_err(|e| malformed(format!("row {}: {e}", i + 1)))?;
        }
        Ok(report)
    }
}

fn malformed(detail: String) -> CoreError {
    CoreError::from(CoreReason::Processing(FailureKind::MalformedReport)).with_detail(detail)
}
