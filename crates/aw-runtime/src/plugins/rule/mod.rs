mod account_manager;
mod monthly_budget;
mod money;

use aw_core::error::{CoreError, CoreReason, CoreResult};
use orion_error::prelude::*;

pub use account_manager::{AccountManager, AddAccountManager};
pub use monthly_budget::AddAccountMonthlyBudget;
pub use money::ConvertMoneyValue;

const EXTERNAL_CUSTOMER_ID: &str = "ExternalCustomerId";

/// Parse a numeric cell, naming the column on failure.
fn parse_number<T: std::str::FromStr>(column: &str, raw: &str) -> CoreResult<T> {
    raw.trim()
        .parse()
        .map_err(|_| {
            CoreError::from(CoreReason::InvalidArgument)
                .with_detail(format!("column {column:?} holds {raw:?}, not a number"))
        })
}

/// Convert a micro-amount cell to a currency amount.
fn convert_micros(column: &str, raw: &str) -> CoreResult<String> {
    parse_number::<i64>(column, raw).map(aw_core::money::micros_to_currency)
}
