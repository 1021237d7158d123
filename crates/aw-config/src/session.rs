use serde::{Deserialize, Serialize};

pub const DEFAULT_ENDPOINT: &str = "https://adwords.google.com";

/// `[session]` section: the prototype every per-account session is derived
/// from.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SessionConfig {
    pub developer_token: String,
    pub user_agent: String,
    /// Manager (MCC) account the credentials belong to, dashes allowed.
    pub manager_account_id: Option<String>,
    pub endpoint: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            developer_token: String::new(),
            user_agent: "aw-alerting".to_string(),
            manager_account_id: None,
            endpoint: DEFAULT_ENDPOINT.to_string(),
        }
    }
}
