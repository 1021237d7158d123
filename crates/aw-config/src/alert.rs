use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ---------------------------------------------------------------------------
// PluginSpec
// ---------------------------------------------------------------------------

/// One plugin entry from the alert file: a type name plus every other key
/// as a free-form parameter object handed to the plugin factory.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PluginSpec {
    #[serde(rename = "Type", alias = "ClassName")]
    pub type_name: String,
    #[serde(flatten)]
    pub params: Map<String, Value>,
}

impl PluginSpec {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            params: Map::new(),
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// The parameter object as a JSON value, ready for `serde_json::from_value`.
    pub fn params_value(&self) -> Value {
        Value::Object(self.params.clone())
    }

    pub fn param_str(&self, key: &str) -> Option<&str> {
        self.params.get(key).and_then(Value::as_str)
    }
}

// ---------------------------------------------------------------------------
// AlertDefinition
// ---------------------------------------------------------------------------

/// One configured alert: downloader, rule chain, message template, actions.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AlertDefinition {
    #[serde(rename = "AlertName")]
    pub name: String,
    #[serde(rename = "ReportDownloader")]
    pub downloader: PluginSpec,
    #[serde(rename = "Rules", default)]
    pub rules: Vec<PluginSpec>,
    #[serde(rename = "AlertMessage")]
    pub message: String,
    #[serde(rename = "Actions", default)]
    pub actions: Vec<PluginSpec>,
}

// ---------------------------------------------------------------------------
// AlertsFile
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AlertsFile {
    #[serde(rename = "Alerts")]
    pub alerts: Vec<AlertDefinition>,
}

impl AlertsFile {
    /// Read, parse and validate an alert definition file.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.as_ref().display()))?;
        content
            .parse()
            .map_err(|e| anyhow::anyhow!("{}: {e}", path.as_ref().display()))
    }

    /// Names used by more than one alert, in first-seen order.
    pub fn duplicate_names(&self) -> Vec<&str> {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        let mut dups = Vec::new();
        for alert in &self.alerts {
            let count = counts.entry(alert.name.as_str()).or_default();
            *count += 1;
            if *count == 2 {
                dups.push(alert.name.as_str());
            }
        }
        dups
    }
}

impl FromStr for AlertsFile {
    type Err = anyhow::Error;

    fn from_str(json: &str) -> anyhow::Result<Self> {
        let file: AlertsFile = serde_json::from_str(json)?;
        crate::validate::validate_alerts(&file)?;
        Ok(file)
    }
}
