use std::path::{Path, PathBuf};

use async_trait::async_trait;
use aw_config::PluginSpec;
use aw_core::error::{CoreError, CoreReason, CoreResult};
use aw_core::plugin::{AlertAction, PluginBuildCtx, plugin_params};
use aw_core::report::{ALERT_MESSAGE_COLUMN, RowView};
use orion_error::prelude::*;
use serde::Deserialize;
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncWriteExt, BufWriter};

use super::{io_failed, timestamp};

const NAME: &str = "SimpleLogFileWriter";

#[derive(Debug, Deserialize)]
struct Params {
    #[serde(rename = "LogFilePathname")]
    path: PathBuf,
    #[serde(rename = "AppendMode", default = "default_append")]
    append: bool,
}

fn default_append() -> bool {
    true
}

/// Appends (or rewrites) a log file with one alert message per line,
/// framed by begin/end-of-run markers.
pub struct SimpleLogFileWriter {
    path: PathBuf,
    append: bool,
    writer: Option<BufWriter<File>>,
}

impl SimpleLogFileWriter {
    /// Relative `LogFilePathname`s resolve against the run's work root.
    pub fn from_spec(spec: &PluginSpec, ctx: &PluginBuildCtx) -> CoreResult<Self> {
        let params: Params = plugin_params(spec)?;
        if params.path.as_os_str().is_empty() {
            return Err(CoreError::from(CoreReason::ConfigLoad)
                .with_detail("SimpleLogFileWriter: LogFilePathname must not be empty"));
        }
        let path = if params.path.is_relative() {
            ctx.work_root.join(params.path)
        } else {
            params.path
        };
        Ok(Self::new(path, params.append))
    }

    pub fn new(path: impl Into<PathBuf>, append: bool) -> Self {
        Self {
            path: path.into(),
            append,
            writer: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn write_line(&mut self, hook: &str, line: &str) -> CoreResult<()> {
        let writer = self.writer.as_mut().ok_or_else(|| {
            CoreError::from(CoreReason::InvalidState)
                .with_detail(format!("{NAME}: {hook} called before initialize"))
        })?;
        writer
            .write_all(format!("{line}\n").as_bytes())
            .await
            .map_err(|e| io_failed(NAME, hook, e))
    }
}

#[async_trait]
impl AlertAction for SimpleLogFileWriter {
    async fn initialize(&mut self) -> CoreResult<()> {
        aw_info!(action, path = %self.path.display(), "start writing alerts to log file");
        if let Some(dir) = self.path.parent()
            && !dir.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|e| io_failed(NAME, "initialize", e))?;
        }
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .append(self.append)
            .truncate(!self.append)
            .open(&self.path)
            .await
            .map_err(|e| io_failed(NAME, "initialize", e))?;
        self.writer = Some(BufWriter::new(file));

        self.write_line("initialize", "===== Begin of this run =====").await?;
        let header = format!("Alerts generated at {}:", timestamp());
        self.write_line("initialize", &header).await
    }

    async fn process_entry(&mut self, row: &RowView<'_>) -> CoreResult<()> {
        let message = row.require(ALERT_MESSAGE_COLUMN)?;
        self.write_line("process_entry", message).await
    }

    async fn finalize(&mut self) -> CoreResult<()> {
        self.write_line("finalize", "===== End of this run =====").await?;
        self.write_line("finalize", "").await?;
        if let Some(mut writer) = self.writer.take() {
            writer.flush().await.map_err(|e| io_failed(NAME, "finalize", e))?;
        }
        aw_info!(action, path = %self.path.display(), "finished writing alerts to log file");
        Ok(())
    }
}
