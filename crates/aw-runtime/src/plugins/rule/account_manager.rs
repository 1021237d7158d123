use aw_config::{AccountId, PluginSpec};
use aw_core::error::{CoreError, CoreReason, CoreResult};
use aw_core::plugin::{AlertRule, plugin_params};
use aw_core::report::RowMut;
use orion_error::prelude::*;
use serde::Deserialize;

use super::EXTERNAL_CUSTOMER_ID;

pub const MANAGER_NAME_COLUMN: &str = "AccountManagerName";
pub const MANAGER_EMAIL_COLUMN: &str = "AccountManagerEmail";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AccountManager {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Email")]
    pub email: String,
}

impl AccountManager {
    fn new(name: &str, email: &str) -> Self {
        Self {
            name: name.to_string(),
            email: email.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct Params {
    #[serde(rename = "Managers", default = "sample_managers")]
    managers: Vec<AccountManager>,
}

fn sample_managers() -> Vec<AccountManager> {
    vec![
        AccountManager::new("Josh G.", "josh@example.com"),
        AccountManager::new("Michael F.", "michael@example.com"),
    ]
}

/// Adds the account manager's name and email to each row.
///
/// The manager is picked from the configured list by account id, so one
/// account always lands with the same manager.
#[derive(Debug, Clone)]
pub struct AddAccountManager {
    managers: Vec<AccountManager>,
}

impl AddAccountManager {
    pub fn from_spec(spec: &PluginSpec) -> CoreResult<Self> {
        let params: Params = plugin_params(spec)?;
        Self::new(params.managers)
    }

    pub fn new(managers: Vec<AccountManager>) -> CoreResult<Self> {
        if managers.is_empty() {
            return Err(CoreError::from(CoreReason::ConfigLoad)
                .with_detail("AddAccountManager: no account managers defined"));
        }
        Ok(Self { managers })
    }

    pub fn manager_for(&self, account: AccountId) -> &AccountManager {
        let idx = (account.get() % self.managers.len() as u64) as usize;
        &self.managers[idx]
    }
}

impl AlertRule for AddAccountManager {
    fn new_columns(&self) -> Vec<String> {
        vec![MANAGER_NAME_COLUMN.to_string(), MANAGER_EMAIL_COLUMN.to_string()]
    }

    fn populate_row(&self, row: &mut RowMut<'_>) -> CoreResult<()> {
        let account: AccountId = row
            .require(EXTERNAL_CUSTOMER_ID)?
            .parse()
            .map_err(|e| {
                CoreError::from(CoreReason::InvalidArgument).with_detail(format!("{EXTERNAL_CUSTOMER_ID}: {e}"))
            })?;
        let manager = self.manager_for(account).clone();
        row.set(MANAGER_NAME_COLUMN, manager.name)?;
        row.set(MANAGER_EMAIL_COLUMN, manager.email)
    }
}
