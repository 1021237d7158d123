//! In-memory tabular report: ordered unique column names mapped to 0-based
//! indices, and ordered rows of string cells.

mod row;
mod set;

#[cfg(test)]
mod tests;

use std::collections::HashMap;
use std::fmt;

use aw_config::AccountId;
use orion_error::prelude::*;

use crate::error::{CoreError, CoreReason, CoreResult};

pub use row::{RowMut, RowView};
pub use set::ReportSet;

/// Column reserved for the rendered alert message.
pub const ALERT_MESSAGE_COLUMN: &str = "AlertMessage";

// ---------------------------------------------------------------------------
// ColumnIndex
// ---------------------------------------------------------------------------

/// Ordered, unique column names with a name → index lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnIndex {
    names: Vec<String>,
    positions: HashMap<String, usize>,
}

impl ColumnIndex {
    pub fn new<I, S>(names: I) -> CoreResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut index = Self::default();
        for name in names {
            index.push(name.into())?;
        }
        Ok(index)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.positions.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.positions.contains_key(name)
    }

    fn push(&mut self, name: String) -> CoreResult<usize> {
        if self.positions.contains_key(&name) {
            return Err(CoreError::from(CoreReason::InvalidArgument).with_detail(format!(
                "cannot append column {name:?}: it already exists in the report header"
            )));
        }
        let idx = self.names.len();
        self.positions.insert(name.clone(), idx);
        self.names.push(name);
        Ok(idx)
    }
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// One account's report for one alert.
///
/// Rows keep their insertion order; filtering removes rows but never
/// reorders the survivors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    report_type: String,
    account_id: AccountId,
    columns: ColumnIndex,
    rows: Vec<Vec<String>>,
}

impl Report {
    /// Empty report with the given header. Duplicate column names are
    /// rejected with `InvalidArgument`.
    pub fn new<I, S>(report_type: impl Into<String>, account_id: AccountId, columns: I) -> CoreResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Ok(Self {
            report_type: report_type.into(),
            account_id,
            columns: ColumnIndex::new(columns)?,
            rows: Vec::new(),
        })
    }

    pub fn report_type(&self) -> &str {
        &self.report_type
    }

    pub fn account_id(&self) -> AccountId {
        self.account_id
    }

    pub fn columns(&self) -> &[String] {
        self.columns.names()
    }

    pub fn column_index_map(&self) -> &ColumnIndex {
        &self.columns
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains(name)
    }

    /// 0-based index of `name`, `InvalidArgument` if the report has no such
    /// column.
    pub fn column_index(&self, name: &str) -> CoreResult<usize> {
        self.columns.position(name).ok_or_else(|| {
            CoreError::from(CoreReason::InvalidArgument).with_detail(format!(
                "column {name:?} is not available in the {} report",
                self.report_type
            ))
        })
    }

    /// Append `name` to the header at the next index.
    ///
    /// Existing rows are not widened; callers add the new cells themselves
    /// (or call [`Report::pad_rows`]). On a duplicate name the report is
    /// left untouched.
    pub fn append_column(&mut self, name: impl Into<String>) -> CoreResult<usize> {
        self.columns.push(name.into())
    }

    /// Append a row. Its length must equal the current column count.
    pub fn add_row(&mut self, row: Vec<String>) -> CoreResult<()> {
        if row.len() != self.columns.len() {
            return Err(CoreError::from(CoreReason::InvalidArgument).with_detail(format!(
                "row has {} cells but the {} report has {} columns",
                row.len(),
                self.report_type,
                self.columns.len()
            )));
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn row(&self, idx: usize) -> Option<RowView<'_>> {
        self.rows.get(idx).map(|cells| RowView::new(&self.columns, cells))
    }

    pub fn row_views(&self) -> impl Iterator<Item = RowView<'_>> {
        self.rows.iter().map(|cells| RowView::new(&self.columns, cells))
    }

    /// Widen every row with empty cells up to the column count.
    pub fn pad_rows(&mut self) {
        let width = self.columns.len();
        for row in &mut self.rows {
            if row.len() < width {
                row.resize(width, String::new());
            }
        }
    }

    /// Visit every row with a mutable, name-addressed view, stopping at the
    /// first error.
    pub fn try_for_each_row_mut<F>(&mut self, mut f: F) -> CoreResult<()>
    where
        F: FnMut(&mut RowMut<'_>) -> CoreResult<()>,
    {
        let columns = &self.columns;
        for cells in &mut self.rows {
            let mut row = RowMut::new(columns, cells);
            f(&mut row)?;
        }
        Ok(())
    }

    /// Remove every row for which `pred` returns true. Returns the number of
    /// removed rows.
    pub fn remove_rows_where<F>(&mut self, mut pred: F) -> usize
    where
        F: FnMut(&RowView<'_>) -> bool,
    {
        let before = self.rows.len();
        let columns = &self.columns;
        self.rows.retain(|cells| !pred(&RowView::new(columns, cells)));
        before - self.rows.len()
    }

    /// Fallible variant of [`Report::remove_rows_where`]. On error no row is
    /// removed.
    pub fn try_remove_rows_where<F>(&mut self, mut pred: F) -> CoreResult<usize>
    where
        F: FnMut(&RowView<'_>) -> CoreResult<bool>,
    {
        let mut doomed = Vec::with_capacity(self.rows.len());
        for cells in &self.rows {
            doomed.push(pred(&RowView::new(&self.columns, cells))?);
        }
        let mut flags = doomed.into_iter();
        let before = self.rows.len();
        self.rows.retain(|_| !flags.next().unwrap_or(false));
        Ok(before - self.rows.len())
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}:", self.report_type)?;
        writeln!(f, "Header:")?;
        writeln!(f, "{}", self.columns.names().join(","))?;
        writeln!(f, "Data:")?;
        for row in &self.rows {
            writeln!(f, "{}", row.join(","))?;
        }
        Ok(())
    }
}
