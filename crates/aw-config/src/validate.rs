use crate::alert::AlertsFile;
use crate::alerting::AlertingConfig;

/// Internal validation, called automatically by `AlertingConfig::from_str` / `load`.
pub(crate) fn validate(config: &AlertingConfig) -> anyhow::Result<()> {
    if config.alerts.as_os_str().is_empty() {
        anyhow::bail!("alerts must name the alert definition file");
    }

    if config.retry.max_attempts == 0 {
        anyhow::bail!("retry.max_attempts must be > 0");
    }

    if let Some(max) = config.retry.max_backoff
        && max < config.retry.backoff
    {
        anyhow::bail!(
            "retry.max_backoff ({max}) is smaller than retry.backoff ({})",
            config.retry.backoff,
        );
    }

    if config.transport.report_dir.as_os_str().is_empty() {
        anyhow::bail!("transport.report_dir must not be empty");
    }

    Ok(())
}

/// Structural checks on an alert file, run before any stage starts.
pub(crate) fn validate_alerts(file: &AlertsFile) -> anyhow::Result<()> {
    if file.alerts.is_empty() {
        anyhow::bail!("Alerts must contain at least one alert");
    }

    for (i, alert) in file.alerts.iter().enumerate() {
        if alert.name.trim().is_empty() {
            anyhow::bail!("Alerts[{i}]: AlertName must not be empty");
        }
        let label = &alert.name;

        if alert.downloader.type_name.trim().is_empty() {
            anyhow::bail!("alert {label:?}: ReportDownloader has an empty type name");
        }
        for (j, rule) in alert.rules.iter().enumerate() {
            if rule.type_name.trim().is_empty() {
                anyhow::bail!("alert {label:?}: Rules[{j}] has an empty type name");
            }
        }
        if alert.message.trim().is_empty() {
            anyhow::bail!("alert {label:?}: AlertMessage must not be empty");
        }
        if alert.actions.is_empty() {
            anyhow::bail!("alert {label:?}: Actions must contain at least one action");
        }
        for (j, action) in alert.actions.iter().enumerate() {
            if action.type_name.trim().is_empty() {
                anyhow::bail!("alert {label:?}: Actions[{j}] has an empty type name");
            }
        }
    }

    Ok(())
}
