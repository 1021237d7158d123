use std::sync::Arc;

use crate::error::CoreResult;
use crate::report::{RowMut, RowView};

/// A row transform: optionally adds columns, fills them per row, then
/// filters rows.
///
/// One instance serves every report of an alert concurrently, so
/// implementations must not rely on per-call mutable state.
pub trait AlertRule: Send + Sync {
    /// Columns this rule appends to each report.
    fn new_columns(&self) -> Vec<String> {
        Vec::new()
    }

    fn populate_row(&self, _row: &mut RowMut<'_>) -> CoreResult<()> {
        Ok(())
    }

    fn should_remove(&self, _row: &RowView<'_>) -> CoreResult<bool> {
        Ok(false)
    }
}

/// A constructed rule and the type name it was built from.
#[derive(Clone)]
pub struct RuleSlot {
    pub name: String,
    pub rule: Arc<dyn AlertRule>,
}

/// Ordered rule chain of one alert; immutable once built.
#[derive(Clone, Default)]
pub struct RuleChain {
    rules: Vec<RuleSlot>,
}

impl RuleChain {
    pub fn new(rules: Vec<RuleSlot>) -> Self {
        Self { rules }
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RuleSlot> {
        self.rules.iter()
    }
}
