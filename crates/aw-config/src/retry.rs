use serde::{Deserialize, Serialize};

use crate::types::HumanDuration;

/// `[retry]` section for report downloads.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_attempts: u32,
    /// Base backoff; the sleep after failed attempt `n` is `backoff * 2^n`.
    pub backoff: HumanDuration,
    /// Optional ceiling on a single sleep.
    pub max_backoff: Option<HumanDuration>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 20,
            backoff: HumanDuration::from_secs(5),
            max_backoff: None,
        }
    }
}
