use std::fmt;

use derive_more::From;
use orion_error::{ErrorCode, StructError, UvsReason};

/// Classification of a processing failure. The retry executor decides
/// whether to retry by looking at this tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// Deriving the per-account session failed.
    Session,
    /// The report transport failed (network, missing export, ...).
    Transport,
    /// The transport answered, but the payload is not a usable report.
    MalformedReport,
    /// A rule body failed on a row.
    Rule,
    /// An action hook failed.
    Action,
    /// All retry attempts were used up.
    Exhausted,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Session => "session",
            Self::Transport => "transport",
            Self::MalformedReport => "malformed-report",
            Self::Rule => "rule",
            Self::Action => "action",
            Self::Exhausted => "exhausted",
        }
    }

    /// Parses the names used in alert definitions (`MalformedReport`,
    /// `Transport`, ...), case-insensitively and with or without dashes.
    pub fn from_name(name: &str) -> Option<Self> {
        let key: String = name
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .map(|c| c.to_ascii_lowercase())
            .collect();
        Some(match key.as_str() {
            "session" => Self::Session,
            "transport" => Self::Transport,
            "malformedreport" => Self::MalformedReport,
            "rule" => Self::Rule,
            "action" => Self::Action,
            "exhausted" => Self::Exhausted,
            _ => return None,
        })
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error, From)]
pub enum CoreReason {
    #[error("config load error")]
    ConfigLoad,
    #[error("invalid argument")]
    InvalidArgument,
    #[error("invalid state")]
    InvalidState,
    #[error("processing error ({0})")]
    Processing(FailureKind),
    #[error("interrupted")]
    Interrupted,
    #[error("{0}")]
    Uvs(UvsReason),
}

impl ErrorCode for CoreReason {
    fn error_code(&self) -> i32 {
        match self {
            Self::ConfigLoad => 1001,
            Self::InvalidArgument => 1002,
            Self::InvalidState => 1003,
            Self::Processing(_) => 1004,
            Self::Interrupted => 1005,
            Self::Uvs(u) => u.error_code(),
        }
    }
}

impl CoreReason {
    /// Processing failures are the only kind a caller may retry.
    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            Self::Processing(kind) => Some(*kind),
            _ => None,
        }
    }
}

pub type CoreError = StructError<CoreReason>;
pub type CoreResult<T> = Result<T, CoreError>;
