use async_trait::async_trait;
use aw_core::error::CoreResult;
use aw_core::plugin::AlertAction;
use aw_core::report::{ALERT_MESSAGE_COLUMN, RowView};
use tokio::io::{AsyncWrite, AsyncWriteExt};

use super::{io_failed, timestamp};

const NAME: &str = "SimpleConsoleWriter";

/// Prints a timestamped header, one alert message per line, then a blank
/// line.
pub struct SimpleConsoleWriter {
    out: Box<dyn AsyncWrite + Send + Unpin>,
}

impl SimpleConsoleWriter {
    pub fn stdout() -> Self {
        Self::with_writer(tokio::io::stdout())
    }

    pub fn with_writer(out: impl AsyncWrite + Send + Unpin + 'static) -> Self {
        Self { out: Box::new(out) }
    }

    async fn write_line(&mut self, hook: &str, line: &str) -> CoreResult<()> {
        self.out
            .write_all(format!("{line}\n").as_bytes())
            .await
            .map_err(|e| io_failed(NAME, hook, e))
    }
}

#[async_trait]
impl AlertAction for SimpleConsoleWriter {
    async fn initialize(&mut self) -> CoreResult<()> {
        let header = format!("Alerts generated at {}:", timestamp());
        self.write_line("initialize", &header).await
    }

    async fn process_entry(&mut self, row: &RowView<'_>) -> CoreResult<()> {
        let message = row.require(ALERT_MESSAGE_COLUMN)?;
        self.write_line("process_entry", message).await
    }

    async fn finalize(&mut self) -> CoreResult<()> {
        self.write_line("finalize", "").await?;
        self.out.flush().await.map_err(|e| io_failed(NAME, "finalize", e))
    }
}
