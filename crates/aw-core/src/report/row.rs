use orion_error::prelude::*;

use super::ColumnIndex;
use crate::error::{CoreError, CoreReason, CoreResult};

// ---------------------------------------------------------------------------
// RowView
// ---------------------------------------------------------------------------

/// Read-only, name-addressed view of one report row.
#[derive(Debug, Clone, Copy)]
pub struct RowView<'a> {
    columns: &'a ColumnIndex,
    cells: &'a [String],
}

impl<'a> RowView<'a> {
    pub(crate) fn new(columns: &'a ColumnIndex, cells: &'a [String]) -> Self {
        Self { columns, cells }
    }

    /// Value of `name`, `None` when the report has no such column.
    pub fn get(&self, name: &str) -> Option<&'a str> {
        self.columns
            .position(name)
            .and_then(|idx| self.cells.get(idx))
            .map(String::as_str)
    }

    /// Value of `name`, `InvalidArgument` when the column is missing.
    pub fn require(&self, name: &str) -> CoreResult<&'a str> {
        self.get(name)
            .ok_or_else(|| missing_column(name))
    }

    pub fn columns(&self) -> &'a [String] {
        self.columns.names()
    }

    pub fn cells(&self) -> &'a [String] {
        self.cells
    }

    /// `(column, value)` pairs in column order.
    pub fn iter(&self) -> impl Iterator<Item = (&'a str, &'a str)> + 'a {
        self.columns
            .names()
            .iter()
            .map(String::as_str)
            .zip(self.cells.iter().map(String::as_str))
    }
}

// ---------------------------------------------------------------------------
// RowMut
// ---------------------------------------------------------------------------

/// Mutable view of one row, used by rules while the owning report is
/// exclusively held by a single rule task.
#[derive(Debug)]
pub struct RowMut<'a> {
    columns: &'a ColumnIndex,
    cells: &'a mut Vec<String>,
}

impl<'a> RowMut<'a> {
    pub(crate) fn new(columns: &'a ColumnIndex, cells: &'a mut Vec<String>) -> Self {
        Self { columns, cells }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.columns
            .position(name)
            .and_then(|idx| self.cells.get(idx))
            .map(String::as_str)
    }

    pub fn require(&self, name: &str) -> CoreResult<&str> {
        self.get(name)
            .ok_or_else(|| missing_column(name))
    }

    /// Overwrite the cell of `name`. The column must exist and the row must
    /// already be wide enough to hold it.
    pub fn set(&mut self, name: &str, value: impl Into<String>) -> CoreResult<()> {
        let idx = self
            .columns
            .position(name)
            .ok_or_else(|| missing_column(name))?;
        let len = self.cells.len();
        let cell = self.cells.get_mut(idx).ok_or_else(|| {
            CoreError::from(CoreReason::InvalidState)
                .with_detail(format!("row has {len} cells, column {name:?} is at index {idx}"))
        })?;
        *cell = value.into();
        Ok(())
    }

    pub fn cells(&self) -> &[String] {
        self.cells
    }

    pub fn as_view(&self) -> RowView<'_> {
        RowView::new(self.columns, self.cells.as_slice())
    }
}

fn missing_column(name: &str) -> CoreError {
    CoreError::from(CoreReason::InvalidArgument).with_detail(format!("row has no column {name:?}"))
}
