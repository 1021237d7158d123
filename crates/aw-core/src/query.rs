//! Report query definition and its AWQL rendering.

use orion_error::prelude::*;
use orion_error::ErrorOweBase;
use serde::{Deserialize, Serialize};

use crate::date_range::DateRange;
use crate::error::{CoreError, CoreReason, CoreResult};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ReportQuery {
    #[serde(rename = "ReportType")]
    pub report_type: String,
    /// Comma-separated field list.
    #[serde(rename = "Fields")]
    pub fields: String,
    #[serde(rename = "Conditions", default, skip_serializing_if = "Option::is_none")]
    pub conditions: Option<String>,
    #[serde(rename = "DateRange", default, skip_serializing_if = "Option::is_none")]
    pub date_range: Option<String>,
}

impl ReportQuery {
    pub fn new(report_type: impl Into<String>, fields: impl Into<String>) -> Self {
        Self {
            report_type: report_type.into(),
            fields: fields.into(),
            conditions: None,
            date_range: None,
        }
    }

    pub fn with_conditions(mut self, conditions: impl Into<String>) -> Self {
        self.conditions = Some(conditions.into());
        self
    }

    pub fn with_date_range(mut self, range: impl Into<String>) -> Self {
        self.date_range = Some(range.into());
        self
    }

    /// Check the query before any download starts.
    pub fn validate(&self) -> CoreResult<()> {
        if self.report_type.trim().is_empty() {
            return Err(CoreError::from(CoreReason::ConfigLoad)
                .with_detail("ReportQuery.ReportType must not be empty"));
        }
        if self.field_names().next().is_none() {
            return Err(CoreError::from(CoreReason::ConfigLoad)
                .with_detail("ReportQuery.Fields must name at least one field"));
        }
        if let Some(range) = &self.date_range {
            DateRange::parse(range).owe(CoreReason::ConfigLoad)?;
        }
        Ok(())
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.split(',').map(str::trim).filter(|f| !f.is_empty())
    }

    /// `SELECT <fields> FROM <type> [WHERE <conditions>] [DURING <range>]`
    pub fn to_awql(&self) -> String {
        let mut awql = format!("SELECT {} FROM {}", self.fields, self.report_type);
        if let Some(conditions) = &self.conditions {
            awql.push_str(" WHERE ");
            awql.push_str(conditions);
        }
        if let Some(range) = &self.date_range {
            awql.push_str(" DURING ");
            awql.push_str(range);
        }
        awql
    }
}
