use std::ops::Deref;
use std::sync::Arc;

use super::Report;

/// Frozen collection of reports shared by every action task.
///
/// Only `&Report` is ever handed out, so no holder can add or remove rows
/// or columns. Cloning is a reference-count bump.
#[derive(Debug, Clone, Default)]
pub struct ReportSet {
    reports: Arc<[Report]>,
}

impl ReportSet {
    pub fn new(reports: Vec<Report>) -> Self {
        Self {
            reports: reports.into(),
        }
    }

    pub fn total_rows(&self) -> usize {
        self.reports.iter().map(Report::row_count).sum()
    }
}

impl From<Vec<Report>> for ReportSet {
    fn from(reports: Vec<Report>) -> Self {
        Self::new(reports)
    }
}

impl Deref for ReportSet {
    type Target = [Report];

    fn deref(&self) -> &[Report] {
        &self.reports
    }
}
