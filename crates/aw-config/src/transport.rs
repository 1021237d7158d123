use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// `[transport]` section: where report data comes from.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TransportConfig {
    pub kind: TransportKind,
    /// Root of exported reports for the `local` transport. Relative paths
    /// resolve against the settings file's directory.
    pub report_dir: PathBuf,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            kind: TransportKind::Local,
            report_dir: PathBuf::from("reports"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    Local,
}
