use async_trait::async_trait;

use crate::error::CoreResult;
use crate::report::RowView;

/// Consumer of an alert's final rows.
///
/// Each instance is driven by exactly one task: `initialize` once,
/// `process_entry` for every row of every report, `finalize` once. Rows are
/// read-only.
#[async_trait]
pub trait AlertAction: Send {
    async fn initialize(&mut self) -> CoreResult<()> {
        Ok(())
    }

    async fn process_entry(&mut self, row: &RowView<'_>) -> CoreResult<()>;

    async fn finalize(&mut self) -> CoreResult<()> {
        Ok(())
    }
}

/// A constructed action and the type name it was built from.
pub struct NamedAction {
    pub name: String,
    pub action: Box<dyn AlertAction>,
}
