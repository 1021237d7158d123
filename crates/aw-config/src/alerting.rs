use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Deserialize;

use crate::accounts::{AccountId, load_account_ids, merge_account_ids};
use crate::logging::LoggingConfig;
use crate::processor::ProcessorConfig;
use crate::retry::RetryConfig;
use crate::session::SessionConfig;
use crate::transport::TransportConfig;
use crate::validate;

// ---------------------------------------------------------------------------
// Raw TOML structure (intermediate representation)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct AlertingConfigRaw {
    alerts: PathBuf,
    #[serde(default)]
    accounts_file: Option<PathBuf>,
    #[serde(default)]
    accounts: Vec<AccountId>,
    #[serde(default)]
    work_root: Option<PathBuf>,
    #[serde(default)]
    processor: ProcessorConfig,
    #[serde(default)]
    retry: RetryConfig,
    #[serde(default)]
    session: SessionConfig,
    #[serde(default)]
    transport: TransportConfig,
    #[serde(default)]
    logging: LoggingConfig,
}

// ---------------------------------------------------------------------------
// AlertingConfig (resolved, validated)
// ---------------------------------------------------------------------------

/// Run settings from `alerting.toml`. Paths are kept as written; use
/// [`AlertingConfig::resolve`] to anchor them at the settings file's
/// directory.
#[derive(Debug, Clone)]
pub struct AlertingConfig {
    /// Directory relative paths are resolved against.
    pub base_dir: PathBuf,
    pub alerts: PathBuf,
    pub accounts_file: Option<PathBuf>,
    pub accounts: Vec<AccountId>,
    pub work_root: PathBuf,
    pub processor: ProcessorConfig,
    pub retry: RetryConfig,
    pub session: SessionConfig,
    pub transport: TransportConfig,
    pub logging: LoggingConfig,
}

impl AlertingConfig {
    /// Read and parse an `alerting.toml` file.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?;
        let mut config: AlertingConfig = content
            .parse()
            .map_err(|e| anyhow::anyhow!("{}: {e}", path.display()))?;
        config.base_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        Ok(config)
    }

    /// Anchor `p` at [`Self::base_dir`] unless it is absolute.
    pub fn resolve(&self, p: &Path) -> PathBuf {
        if p.is_absolute() {
            p.to_path_buf()
        } else {
            self.base_dir.join(p)
        }
    }

    pub fn alerts_path(&self) -> PathBuf {
        self.resolve(&self.alerts)
    }

    pub fn work_root_path(&self) -> PathBuf {
        self.resolve(&self.work_root)
    }

    pub fn report_dir_path(&self) -> PathBuf {
        self.resolve(&self.transport.report_dir)
    }

    /// Collect the account set: ids from `accounts_file_override` (or the
    /// configured `accounts_file`) followed by the inline `accounts` list.
    /// An empty result is an error.
    pub fn load_accounts(&self, accounts_file_override: Option<&Path>) -> anyhow::Result<Vec<AccountId>> {
        let file = accounts_file_override
            .map(Path::to_path_buf)
            .or_else(|| self.accounts_file.as_deref().map(|p| self.resolve(p)));
        let from_file = match file {
            Some(path) => load_account_ids(&path)?,
            None => Vec::new(),
        };
        let ids = merge_account_ids([from_file.as_slice(), self.accounts.as_slice()]);
        if ids.is_empty() {
            anyhow::bail!("no account ids configured (set accounts_file, accounts, or --accounts)");
        }
        Ok(ids)
    }
}

impl FromStr for AlertingConfig {
    type Err = anyhow::Error;

    /// Parse a TOML string into a validated [`AlertingConfig`]. The base
    /// directory is the current directory.
    fn from_str(toml_str: &str) -> anyhow::Result<Self> {
        let raw: AlertingConfigRaw = toml::from_str(toml_str)?;

        let config = AlertingConfig {
            base_dir: PathBuf::from("."),
            alerts: raw.alerts,
            accounts_file: raw.accounts_file,
            accounts: raw.accounts,
            work_root: raw.work_root.unwrap_or_else(|| PathBuf::from(".")),
            processor: raw.processor,
            retry: raw.retry,
            session: raw.session,
            transport: raw.transport,
            logging: raw.logging,
        };

        validate::validate(&config)?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::LogFormat;
    use crate::transport::TransportKind;
    use crate::types::HumanDuration;

    const FULL_TOML: &str = r#"
alerts = "alerts.json"
accounts_file = "accounts.txt"
accounts = [1234567890, "987-654-3210"]
work_root = "out"

[processor]
threads = 4

[retry]
max_attempts = 3
backoff = "500ms"
max_backoff = "10s"

[session]
developer_token = "dev-token"
user_agent = "alerting-test"
manager_account_id = "111-222-3333"

[transport]
kind = "local"
report_dir = "exports"

[logging]
level = "warn"
format = "json"
modules = { "aw_runtime::download" = "debug" }
"#;

    #[test]
    fn load_full_toml() {
        let cfg: AlertingConfig = FULL_TOML.parse().unwrap();
        assert_eq!(cfg.alerts, PathBuf::from("alerts.json"));
        assert_eq!(cfg.accounts.len(), 2);
        assert_eq!(cfg.processor.effective_threads(), 4);
        assert_eq!(cfg.retry.max_attempts, 3);
        assert_eq!(cfg.retry.backoff, HumanDuration::from_millis(500));
        assert_eq!(cfg.retry.max_backoff, Some(HumanDuration::from_secs(10)));
        assert_eq!(cfg.session.developer_token, "dev-token");
        assert_eq!(cfg.session.endpoint, crate::session::DEFAULT_ENDPOINT);
        assert_eq!(cfg.transport.kind, TransportKind::Local);
        assert_eq!(cfg.logging.format, LogFormat::Json);
        assert_eq!(
            cfg.logging.modules.get("aw_runtime::download").map(String::as_str),
            Some("debug")
        );
    }

    #[test]
    fn minimal_toml_uses_defaults() {
        let cfg: AlertingConfig = r#"alerts = "alerts.json""#.parse().unwrap();
        assert_eq!(cfg.processor.effective_threads(), 20);
        assert_eq!(cfg.retry.max_attempts, 20);
        assert_eq!(cfg.retry.backoff, HumanDuration::from_secs(5));
        assert_eq!(cfg.retry.max_backoff, None);
        assert_eq!(cfg.work_root, PathBuf::from("."));
        assert_eq!(cfg.transport.report_dir, PathBuf::from("reports"));
    }

    #[test]
    fn zero_threads_falls_back_to_default() {
        let cfg: AlertingConfig = "alerts = \"a.json\"\n[processor]\nthreads = 0\n"
            .parse()
            .unwrap();
        assert_eq!(cfg.processor.effective_threads(), 20);
    }

    #[test]
    fn missing_alerts_key_is_rejected() {
        assert!("[processor]\nthreads = 2\n".parse::<AlertingConfig>().is_err());
    }

    #[test]
    fn load_resolves_relative_paths() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("accounts.txt"), "123-456-7890\n# skip\n").unwrap();
        let settings = dir.path().join("alerting.toml");
        std::fs::write(
            &settings,
            "alerts = \"alerts.json\"\naccounts_file = \"accounts.txt\"\naccounts = [42]\n",
        )
        .unwrap();

        let cfg = AlertingConfig::load(&settings).unwrap();
        assert_eq!(cfg.alerts_path(), dir.path().join("alerts.json"));
        assert_eq!(cfg.report_dir_path(), dir.path().join("reports"));

        let ids = cfg.load_accounts(None).unwrap();
        assert_eq!(ids, vec![AccountId::new(1234567890), AccountId::new(42)]);
    }

    #[test]
    fn accounts_override_and_empty_set() {
        let dir = tempfile::tempdir().unwrap();
        let other = dir.path().join("other.txt");
        std::fs::write(&other, "7\n").unwrap();

        let cfg: AlertingConfig = r#"alerts = "alerts.json""#.parse().unwrap();
        assert!(cfg.load_accounts(None).is_err());
        assert_eq!(cfg.load_accounts(Some(&other)).unwrap(), vec![AccountId::new(7)]);
    }
}
