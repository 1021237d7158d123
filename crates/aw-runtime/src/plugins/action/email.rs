use std::collections::BTreeMap;
use std::fmt::Write as _;

use async_trait::async_trait;
use aw_config::PluginSpec;
use aw_core::error::{CoreError, CoreReason, CoreResult};
use aw_core::plugin::{AlertAction, plugin_params};
use aw_core::report::{ALERT_MESSAGE_COLUMN, RowView};
use orion_error::prelude::*;
use serde::Deserialize;

use super::timestamp;

const FROM: &str = "aw-report-alerting@example.com";
const MANAGER_EMAIL_COLUMN: &str = "AccountManagerEmail";
const EXTERNAL_CUSTOMER_ID: &str = "ExternalCustomerId";

#[derive(Debug, Deserialize)]
struct Params {
    #[serde(rename = "Subject")]
    subject: String,
    /// Comma-separated addresses.
    #[serde(rename = "CC", default)]
    cc: Option<String>,
}

/// Alerts addressed to one account manager, grouped by account id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlertEmail {
    pub to: String,
    pub alerts: BTreeMap<String, Vec<String>>,
}

impl AlertEmail {
    fn new(to: &str) -> Self {
        Self {
            to: to.to_string(),
            alerts: BTreeMap::new(),
        }
    }

    /// Plain-text rendering of the email.
    pub fn render(&self, subject: &str, cc: &[String], date: &str) -> String {
        let mut out = String::from("\n===== Alert email starts =====\n\n");
        writeln!(out, "From: {FROM}").ok();
        writeln!(out, "To: {}", self.to).ok();
        writeln!(out, "Subject: {subject}").ok();
        for (i, addr) in cc.iter().enumerate() {
            let prefix = if i == 0 { "Cc: " } else { "    " };
            writeln!(out, "{prefix}{addr}").ok();
        }
        writeln!(out, "Date: {date}\n").ok();
        for (account, messages) in &self.alerts {
            writeln!(out, "Account ID: {account}").ok();
            for message in messages {
                writeln!(out, "  {message}").ok();
            }
            out.push('\n');
        }
        out.push_str("===== Alert email ends =====\n");
        out
    }
}

/// Collects alerts per account manager and emits one email per manager on
/// finalize. Delivery is a log record of the rendered email.
#[derive(Debug)]
pub struct PerAccountManagerEmailSender {
    subject: String,
    cc: Vec<String>,
    emails: BTreeMap<String, AlertEmail>,
}

impl PerAccountManagerEmailSender {
    pub fn from_spec(spec: &PluginSpec) -> CoreResult<Self> {
        let params: Params = plugin_params(spec)?;
        if params.subject.trim().is_empty() {
            return Err(CoreError::from(CoreReason::ConfigLoad)
                .with_detail("PerAccountManagerEmailSender: Subject must not be empty"));
        }
        let cc = params
            .cc
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        Ok(Self {
            subject: params.subject,
            cc,
            emails: BTreeMap::new(),
        })
    }

    pub fn emails(&self) -> impl Iterator<Item = &AlertEmail> {
        self.emails.values()
    }

    pub fn render_all(&self, date: &str) -> Vec<String> {
        self.emails
            .values()
            .map(|email| email.render(&self.subject, &self.cc, date))
            .collect()
    }
}

#[async_trait]
impl AlertAction for PerAccountManagerEmailSender {
    async fn process_entry(&mut self, row: &RowView<'_>) -> CoreResult<()> {
        let to = row.require(MANAGER_EMAIL_COLUMN)?;
        let account = row.require(EXTERNAL_CUSTOMER_ID)?;
        let message = row.require(ALERT_MESSAGE_COLUMN)?;
        self.emails
            .entry(to.to_string())
            .or_insert_with(|| AlertEmail::new(to))
            .alerts
            .entry(account.to_string())
            .or_default()
            .push(message.to_string());
        Ok(())
    }

    async fn finalize(&mut self) -> CoreResult<()> {
        let date = timestamp();
        for (to, body) in self.emails.keys().zip(self.render_all(&date)) {
            aw_info!(action, to = %to, "alert email\n{body}");
        }
        Ok(())
    }
}
