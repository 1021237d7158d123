use serde::{Deserialize, Serialize};

pub const DEFAULT_THREADS: usize = 20;

/// `[processor]` section: worker-pool sizing shared by every stage of a run.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProcessorConfig {
    /// Upper bound on concurrently running downloads, rule chains and
    /// actions. `0` falls back to [`DEFAULT_THREADS`].
    pub threads: usize,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            threads: DEFAULT_THREADS,
        }
    }
}

impl ProcessorConfig {
    pub fn effective_threads(&self) -> usize {
        if self.threads == 0 {
            DEFAULT_THREADS
        } else {
            self.threads
        }
    }
}
