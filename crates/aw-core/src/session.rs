//! Session prototype and per-account derivation.

use aw_config::{AccountId, SessionConfig};
use orion_error::prelude::*;
use orion_error::ErrorOweBase;

use crate::error::{CoreError, CoreReason, CoreResult, FailureKind};

/// Immutable credentials and client settings shared by every account of a
/// run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionPrototype {
    pub developer_token: String,
    pub user_agent: String,
    pub manager_account_id: Option<AccountId>,
    pub endpoint: String,
}

impl SessionPrototype {
    /// Build the prototype from the `[session]` settings. A malformed
    /// manager account id is a configuration error.
    pub fn from_config(cfg: &SessionConfig) -> CoreResult<Self> {
        let manager_account_id = match cfg.manager_account_id.as_deref() {
            Some(raw) if !raw.trim().is_empty() => {
                Some(raw.parse::<AccountId>().owe(CoreReason::ConfigLoad)?)
            }
            _ => None,
        };
        Ok(Self {
            developer_token: cfg.developer_token.clone(),
            user_agent: cfg.user_agent.clone(),
            manager_account_id,
            endpoint: cfg.endpoint.clone(),
        })
    }

    /// Copy of the prototype scoped to `account`.
    ///
    /// Fails with `Processing(Session)` for the reserved id `0` or when no
    /// developer token is configured; callers record it as a failure of
    /// that account only.
    pub fn for_account(&self, account: AccountId) -> CoreResult<AccountSession> {
        if account.get() == 0 {
            return Err(CoreError::from(CoreReason::Processing(FailureKind::Session))
                .with_detail("account id 0 is not a valid client customer id"));
        }
        if self.developer_token.trim().is_empty() {
            return Err(CoreError::from(CoreReason::Processing(FailureKind::Session)).with_detail(format!(
                "cannot derive session for account {account}: developer token is empty"
            )));
        }
        Ok(AccountSession {
            account_id: account,
            prototype: self.clone(),
        })
    }
}

/// A request-scoped session bound to one client account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountSession {
    pub account_id: AccountId,
    pub prototype: SessionPrototype,
}
