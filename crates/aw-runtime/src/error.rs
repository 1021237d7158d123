use derive_more::From;
use orion_error::prelude::*;
use orion_error::{ErrorCode, StructError, UvsReason};

use aw_core::error::{CoreError, CoreReason};

#[derive(Debug, Clone, PartialEq, thiserror::Error, From)]
pub enum RuntimeReason {
    #[error("{0}")]
    Core(CoreReason),
    #[error("{0}")]
    Uvs(UvsReason),
}

impl ErrorCode for RuntimeReason {
    fn error_code(&self) -> i32 {
        match self {
            Self::Core(c) => c.error_code(),
            Self::Uvs(u) => u.error_code(),
        }
    }
}

pub type RuntimeError = StructError<RuntimeReason>;
pub type RuntimeResult<T> = Result<T, RuntimeError>;

/// Attribute a core failure to the alert it happened in. The core reason
/// is kept so callers can still tell a config error from an interruption.
pub fn alert_failure(name: &str, err: CoreError) -> RuntimeError {
    RuntimeError::from(RuntimeReason::Core(err.reason().clone()))
        .with_detail(format!("alert {name:?} failed: {err}"))
}
