mod console;
mod email;
mod log_file;

pub use console::SimpleConsoleWriter;
pub use email::{AlertEmail, PerAccountManagerEmailSender};
pub use log_file::SimpleLogFileWriter;

use aw_core::error::{CoreError, CoreReason, FailureKind};
use orion_error::prelude::*;

const TIMESTAMP_FORMAT: &str = "%Y/%m/%d %H:%M";

fn timestamp() -> String {
    chrono::Local::now().format(TIMESTAMP_FORMAT).to_string()
}

fn io_failed(action: &str, hook: &str, err: std::io::Error) -> CoreError {
    CoreError::from(CoreReason::Processing(FailureKind::Action))
        .with_detail(format!("{action}: {hook} failed: {err}"))
}
